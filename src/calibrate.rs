//! Confidence calibration.
//!
//! Each surviving span's confidence is adjusted against the document's
//! context map, then gated on a minimum threshold selected by the document
//! profile and the span's filter type. Spans falling below the gate are
//! dropped here, never applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::{ContextMap, DocumentProfile};
use crate::span::{FilterType, Span};

const PATTERN_BONUS: f64 = 0.10;
const LONG_SPAN_BONUS: f64 = 0.05;
const SHORT_SPAN_PENALTY: f64 = 0.10;
const AMBIGUITY_PENALTY_STEP: f64 = 0.05;

/// Per-(profile, type) minimum-confidence table with sensible defaults.
/// Keys in the override map are `"PROFILE/FILTER_TYPE"` labels so the table
/// can be loaded straight from configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thresholds {
    pub base: f64,
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        // Names need more support in forms and tables, where capitalized
        // field text is everywhere; structured identifiers need less.
        for profile in ["FORM", "TABLE", "LIST"] {
            overrides.insert(format!("{profile}/NAME"), 0.65);
            overrides.insert(format!("{profile}/ADDRESS"), 0.6);
        }
        overrides.insert("NARRATIVE/NAME".to_string(), 0.55);
        for ft in [FilterType::Ssn, FilterType::Mrn, FilterType::CreditCard, FilterType::Email] {
            for profile in ["FORM", "NARRATIVE", "TABLE", "LIST", "MIXED", "UNKNOWN"] {
                overrides.insert(format!("{profile}/{}", ft.label()), 0.4);
            }
        }
        Thresholds {
            base: 0.5,
            overrides,
        }
    }
}

impl Thresholds {
    pub fn minimum(&self, profile: DocumentProfile, ft: FilterType) -> f64 {
        self.overrides
            .get(&format!("{}/{}", profile.label(), ft.label()))
            .copied()
            .unwrap_or(self.base)
    }
}

/// One factor contributing to a span's final confidence; surfaced in the
/// explanation report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    pub source: String,
    pub value: f64,
}

/// Calibration outcome for one span.
pub struct Calibrated {
    pub span: Span,
    pub factors: Vec<ConfidenceFactor>,
}

/// A span dropped by the threshold gate.
pub struct BelowThreshold {
    pub span: Span,
    pub threshold: f64,
    pub factors: Vec<ConfidenceFactor>,
}

pub struct CalibrationOutcome {
    pub kept: Vec<Calibrated>,
    pub dropped: Vec<BelowThreshold>,
}

/// `confidence' = clamp(confidence + context_boost + pattern_bonus +
/// length_adjust - ambiguity_penalty, 0, 1)`, then gate on the profile/type
/// minimum. `threshold_relief` (from the document-quality analyzer) lowers
/// the gate on degraded documents; the floor keeps it from vanishing.
pub fn calibrate(
    spans: Vec<Span>,
    context: &ContextMap,
    thresholds: &Thresholds,
    threshold_relief: f64,
) -> CalibrationOutcome {
    let profile = context.profile();
    let mut kept = Vec::with_capacity(spans.len());
    let mut dropped = Vec::new();

    for mut span in spans {
        let mut factors = vec![ConfidenceFactor {
            source: "detection".to_string(),
            value: span.confidence,
        }];

        let boost = context.boost_at(span.start, span.len());
        if boost > 0.0 {
            factors.push(ConfidenceFactor {
                source: "clinical-context".to_string(),
                value: boost,
            });
        }

        let pattern_bonus = if span.pattern.is_some() { PATTERN_BONUS } else { 0.0 };
        if pattern_bonus > 0.0 {
            factors.push(ConfidenceFactor {
                source: "pattern".to_string(),
                value: pattern_bonus,
            });
        }

        let length_adjust = if span.len() > 20 {
            LONG_SPAN_BONUS
        } else if span.len() < 3 {
            -SHORT_SPAN_PENALTY
        } else {
            0.0
        };
        if length_adjust != 0.0 {
            factors.push(ConfidenceFactor {
                source: "length".to_string(),
                value: length_adjust,
            });
        }

        let ambiguity = AMBIGUITY_PENALTY_STEP * span.ambiguous_with.len() as f64;
        if ambiguity > 0.0 {
            factors.push(ConfidenceFactor {
                source: "ambiguity".to_string(),
                value: -ambiguity,
            });
        }

        span.confidence =
            (span.confidence + boost + pattern_bonus + length_adjust - ambiguity).clamp(0.0, 1.0);

        let minimum = (thresholds.minimum(profile, span.filter_type) - threshold_relief).max(0.05);
        if span.confidence >= minimum {
            kept.push(Calibrated { span, factors });
        } else {
            tracing::debug!(
                filter = span.filter_type.label(),
                confidence = span.confidence,
                minimum,
                "span below calibrated threshold"
            );
            dropped.push(BelowThreshold {
                span,
                threshold: minimum,
                factors,
            });
        }
    }

    CalibrationOutcome { kept, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FilterType;

    fn span_at(doc_pos: usize, len: usize, confidence: f64) -> Span {
        Span::detected(
            FilterType::Name,
            doc_pos,
            doc_pos + len,
            "x".repeat(len),
            confidence,
            "t",
        )
    }

    #[test]
    fn context_boost_and_pattern_bonus_apply() {
        let doc = "Patient: John was admitted and complains of pain";
        let ctx = ContextMap::build(doc);
        let out = calibrate(vec![span_at(9, 4, 0.6)], &ctx, &Thresholds::default(), 0.0);
        assert_eq!(out.kept.len(), 1);
        // 0.6 + 0.15 strong context + 0.10 pattern id.
        assert!((out.kept[0].span.confidence - 0.85).abs() < 1e-9);
        assert!(out.kept[0]
            .factors
            .iter()
            .any(|f| f.source == "clinical-context"));
    }

    #[test]
    fn short_span_penalty_and_clamp() {
        let ctx = ContextMap::build("no indicators here");
        let mut span = span_at(0, 2, 0.05);
        span.pattern = None;
        let out = calibrate(vec![span], &ctx, &Thresholds::default(), 0.0);
        assert!(out.kept.is_empty());
        assert_eq!(out.dropped.len(), 1);
        assert!(out.dropped[0].span.confidence.abs() < 1e-9);
    }

    #[test]
    fn long_span_bonus() {
        let ctx = ContextMap::build("no indicators here at all");
        let out = calibrate(vec![span_at(0, 25, 0.5)], &ctx, &Thresholds::default(), 0.0);
        // 0.5 + 0.10 pattern + 0.05 length.
        assert!((out.kept[0].span.confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn ambiguity_penalty() {
        let ctx = ContextMap::build("plain text");
        let mut span = span_at(0, 5, 0.7);
        span.ambiguous_with.insert(FilterType::Fax);
        span.ambiguous_with.insert(FilterType::Date);
        let out = calibrate(vec![span], &ctx, &Thresholds::default(), 0.0);
        // 0.7 + 0.10 pattern - 2 * 0.05.
        assert!((out.kept[0].span.confidence - 0.70).abs() < 1e-9);
    }

    #[test]
    fn threshold_varies_by_profile() {
        let thresholds = Thresholds::default();
        assert!(
            thresholds.minimum(DocumentProfile::Form, FilterType::Name)
                > thresholds.minimum(DocumentProfile::Narrative, FilterType::Name)
        );
        assert!(
            thresholds.minimum(DocumentProfile::Form, FilterType::Ssn)
                < thresholds.minimum(DocumentProfile::Form, FilterType::Name)
        );
    }

    #[test]
    fn quality_relief_lowers_the_gate() {
        let ctx = ContextMap::build("plain text");
        let mut span = span_at(0, 5, 0.38);
        span.pattern = None;
        // UNKNOWN/NAME minimum is 0.5; relief of 0.12 admits 0.38.
        let strict = calibrate(vec![span.clone()], &ctx, &Thresholds::default(), 0.0);
        assert!(strict.kept.is_empty());
        let relieved = calibrate(vec![span], &ctx, &Thresholds::default(), 0.12);
        assert_eq!(relieved.kept.len(), 1);
    }

    #[test]
    fn below_threshold_records_gate() {
        let doc = "Name: A\nDOB: B\nMRN: C\n";
        let ctx = ContextMap::build(doc);
        assert_eq!(ctx.profile(), DocumentProfile::Form);
        let mut span = span_at(0, 4, 0.2);
        span.pattern = None;
        let out = calibrate(vec![span], &ctx, &Thresholds::default(), 0.0);
        assert_eq!(out.dropped.len(), 1);
        assert!((out.dropped[0].threshold - 0.65).abs() < 1e-9);
    }
}
