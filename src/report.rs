//! Structured reporting: what was detected, what was applied, what was
//! suppressed and why, with per-phase timing. Side-effect free; shipping the
//! report anywhere is an external concern.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::calibrate::ConfidenceFactor;
use crate::span::Span;

/// Byte position of a span in the input document.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// Final disposition of one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Redacted,
    Pruned,
    BelowThreshold,
    Ignored,
    Suppressed,
}

/// Per-span provenance for audit tooling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Explanation {
    pub detected_value: String,
    pub phi_type: String,
    pub matched_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_matched: Option<String>,
    pub dictionary_hit: bool,
    pub context_indicators: Vec<String>,
    pub confidence_factors: Vec<ConfidenceFactor>,
    pub final_confidence: f64,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_detail: Option<String>,
    pub position: Position,
}

impl Explanation {
    /// Build the provenance record for a span with whatever detail the
    /// pipeline collected for it.
    pub fn for_span(
        span: &Span,
        factors: Vec<ConfidenceFactor>,
        context_indicators: Vec<String>,
        decision: Decision,
        decision_detail: Option<String>,
    ) -> Self {
        Explanation {
            detected_value: span.text.clone(),
            phi_type: span.filter_type.label().to_string(),
            matched_by: if span.dictionary_hit {
                "dictionary".to_string()
            } else {
                "pattern".to_string()
            },
            pattern_matched: span.pattern.clone(),
            dictionary_hit: span.dictionary_hit,
            context_indicators,
            confidence_factors: factors,
            final_confidence: span.confidence,
            decision,
            decision_detail,
            position: Position {
                start: span.start,
                end: span.end,
            },
        }
    }
}

/// Milliseconds spent in each pipeline phase.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub context_ms: u64,
    pub detect_ms: u64,
    pub resolve_ms: u64,
    pub prune_ms: u64,
    pub calibrate_ms: u64,
    pub apply_ms: u64,
}

/// The full per-request report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Report {
    pub total_detections: usize,
    pub redacted_count: usize,
    pub allowed_count: usize,
    /// Applied redactions per type label.
    pub by_type: BTreeMap<String, usize>,
    /// Raw candidate counts per type label, before resolution.
    pub detected_by_type: BTreeMap<String, usize>,
    pub explanations: Vec<Explanation>,
    pub warnings: Vec<String>,
    /// Filters whose contribution was dropped after an internal failure.
    pub filter_errors: Vec<String>,
    pub document_profile: String,
    pub document_quality: String,
    pub timing: PhaseTimings,
    pub timestamp_ms: u64,
    pub execution_time_ms: u64,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Summary derived from an existing span list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplanationReport {
    pub threshold: f64,
    pub redacted: usize,
    pub suppressed: usize,
    pub explanations: Vec<Explanation>,
}

/// Derive human-readable decisions from an existing result. Applied spans
/// read as redacted; the rest are classified against `threshold`.
pub fn explain(spans: &[Span], threshold: f64) -> ExplanationReport {
    let mut explanations = Vec::with_capacity(spans.len());
    let mut redacted = 0;
    let mut suppressed = 0;

    for span in spans {
        let decision = if span.applied {
            redacted += 1;
            Decision::Redacted
        } else if span.ignored {
            suppressed += 1;
            Decision::Ignored
        } else if span.confidence < threshold {
            suppressed += 1;
            Decision::BelowThreshold
        } else {
            suppressed += 1;
            Decision::Suppressed
        };
        explanations.push(Explanation::for_span(span, Vec::new(), Vec::new(), decision, None));
    }

    ExplanationReport {
        threshold,
        redacted,
        suppressed,
        explanations,
    }
}
