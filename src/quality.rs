//! Document quality assessment.
//!
//! OCR-damaged documents need more permissive gating: confusable digits
//! inside words, mIxEd case, and spacing damage all depress detection
//! confidence for values that are still PHI. One pass measures the damage
//! and yields a bounded threshold relief applied by the calibrator.
//!
//! Score model: weighted indicator mix normalized by token count, squashed
//! through a sigmoid so isolated artifacts in a clean document stay near
//! zero while systematic corruption saturates.

use serde::{Deserialize, Serialize};

/// Relief never exceeds this much of the configured minimum threshold.
const MAX_THRESHOLD_RELIEF: f64 = 0.12;

/// Individual damage signals, each normalized to [0, 1].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct QualityIndicators {
    /// Digit-for-letter substitutions inside alphabetic tokens (l23, J0hn).
    pub digit_substitutions: f64,
    /// Case inconsistency inside tokens (mIxEd CaSe).
    pub case_chaos: f64,
    /// Runs of repeated spaces or missing spaces after punctuation.
    pub spacing_anomalies: f64,
    /// Replacement characters and control bytes from a damaged decode.
    pub char_corruption: f64,
}

/// Coarse quality band, reported for audit tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityBand {
    Clean,
    Noisy,
    Degraded,
    Chaotic,
}

impl QualityBand {
    pub fn label(&self) -> &'static str {
        match self {
            QualityBand::Clean => "CLEAN",
            QualityBand::Noisy => "NOISY",
            QualityBand::Degraded => "DEGRADED",
            QualityBand::Chaotic => "CHAOTIC",
        }
    }
}

/// One-pass analysis result; pure function of the document text.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QualityAnalysis {
    /// 0.0 (clean) to 1.0 (total chaos).
    pub score: f64,
    pub indicators: QualityIndicators,
    pub band: QualityBand,
    /// Subtracted from calibration minimums; in [0, MAX_THRESHOLD_RELIEF].
    pub threshold_relief: f64,
}

impl Default for QualityAnalysis {
    fn default() -> Self {
        QualityAnalysis {
            score: 0.0,
            indicators: QualityIndicators::default(),
            band: QualityBand::Clean,
            threshold_relief: 0.0,
        }
    }
}

fn is_confusable_digit(c: char) -> bool {
    matches!(c, '0' | '1' | '5' | '8' | '6' | '9' | '2')
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn analyze(text: &str) -> QualityAnalysis {
    if text.is_empty() {
        return QualityAnalysis::default();
    }

    let mut tokens = 0usize;
    let mut tokens_with_substitution = 0usize;
    let mut tokens_with_case_chaos = 0usize;

    for token in text.split_whitespace() {
        let letters = token.chars().filter(|c| c.is_ascii_alphabetic()).count();
        if letters == 0 {
            continue;
        }
        tokens += 1;

        // Alphabetic token with confusable digits mixed in.
        let confusables = token
            .chars()
            .filter(|c| is_confusable_digit(*c))
            .count();
        if confusables > 0 && letters >= 2 {
            tokens_with_substitution += 1;
        }

        // Lowercase-to-uppercase flips after the first character.
        let mut flips = 0usize;
        let mut prev_upper: Option<bool> = None;
        for c in token.chars().filter(|c| c.is_ascii_alphabetic()) {
            let upper = c.is_ascii_uppercase();
            if let Some(prev) = prev_upper {
                if prev != upper {
                    flips += 1;
                }
            }
            prev_upper = Some(upper);
        }
        if flips >= 3 {
            tokens_with_case_chaos += 1;
        }
    }

    let chars = text.chars().count().max(1);
    let multi_space_runs = text.matches("   ").count();
    let missing_space_after_stop = text
        .as_bytes()
        .windows(2)
        .filter(|w| (w[0] == b'.' || w[0] == b',') && w[1].is_ascii_alphabetic())
        .count();
    let corrupt_chars = text
        .chars()
        .filter(|c| *c == '\u{FFFD}' || (c.is_control() && *c != '\n' && *c != '\r' && *c != '\t'))
        .count();

    let tokens = tokens.max(1);
    let indicators = QualityIndicators {
        digit_substitutions: (tokens_with_substitution as f64 / tokens as f64).min(1.0),
        case_chaos: (tokens_with_case_chaos as f64 / tokens as f64).min(1.0),
        spacing_anomalies: ((multi_space_runs + missing_space_after_stop) as f64
            / tokens as f64)
            .min(1.0),
        char_corruption: (corrupt_chars as f64 * 40.0 / chars as f64).min(1.0),
    };

    let weighted = 0.45 * indicators.digit_substitutions
        + 0.25 * indicators.case_chaos
        + 0.15 * indicators.spacing_anomalies
        + 0.15 * indicators.char_corruption;
    // Center the sigmoid so ~8% damaged tokens reads as the knee.
    let score = if weighted <= f64::EPSILON {
        0.0
    } else {
        sigmoid((weighted - 0.08) * 18.0)
    };

    let band = if score < 0.25 {
        QualityBand::Clean
    } else if score < 0.5 {
        QualityBand::Noisy
    } else if score < 0.8 {
        QualityBand::Degraded
    } else {
        QualityBand::Chaotic
    };

    QualityAnalysis {
        score,
        indicators,
        band,
        threshold_relief: score * MAX_THRESHOLD_RELIEF,
    }
}
