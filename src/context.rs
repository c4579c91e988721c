//! Clinical context detection.
//!
//! One pass over the document produces a vector of context windows tagged
//! with a strength; the calibrator and the context-aware filter family query
//! it by position. The same pass classifies the document's structural
//! profile, which selects the per-type confidence thresholds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Influence radius of a single indicator hit, in bytes.
const INDICATOR_RADIUS: usize = 150;

/// Clinical-context strength for a character range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextStrength {
    None,
    Weak,
    Moderate,
    Strong,
}

impl ContextStrength {
    /// Confidence boost added by the calibrator.
    pub fn boost(&self) -> f64 {
        match self {
            ContextStrength::Strong => 0.15,
            ContextStrength::Moderate => 0.10,
            ContextStrength::Weak => 0.05,
            ContextStrength::None => 0.0,
        }
    }

    fn from_weight(weight: u32) -> Self {
        match weight {
            0 => ContextStrength::None,
            1..=2 => ContextStrength::Weak,
            3..=4 => ContextStrength::Moderate,
            _ => ContextStrength::Strong,
        }
    }
}

struct Indicator {
    re: &'static Lazy<Regex>,
    weight: u32,
    label: &'static str,
}

static PATIENT_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:patient|pt|subject|name|dob|mrn|ssn)\s*[:=#]").expect("patient label re")
});

static CLINICAL_SETTING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:admitted|discharged|transferred|seen in|presented to|emergency department|intensive care|clinic visit|inpatient|outpatient)\b")
        .expect("clinical setting re")
});

static MEDICAL_ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:complains of|presents with|diagnosed with|prescribed|denies|reports|underwent|examined by|evaluated by|treated (?:for|with))\b")
        .expect("medical action re")
});

static TEMPORAL_CLINICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:on admission|at discharge|post-?op(?:erative)? day|follow-?up|hospital day|since onset)\b")
        .expect("temporal clinical re")
});

static DEMOGRAPHIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:\d{1,3}[- ]?(?:year[- ]old|y/?o)|male|female|man|woman)\b")
        .expect("demographic re")
});

static STRUCTURE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:CHIEF COMPLAINT|HPI|HISTORY OF PRESENT ILLNESS|ASSESSMENT|PLAN|MEDICATIONS|ALLERGIES|PHYSICAL EXAM(?:INATION)?|REVIEW OF SYSTEMS|IMPRESSION|FINDINGS)\b")
        .expect("structure header re")
});

static INDICATORS: &[Indicator] = &[
    Indicator { re: &PATIENT_LABEL_RE, weight: 3, label: "patient-label" },
    Indicator { re: &CLINICAL_SETTING_RE, weight: 2, label: "clinical-setting" },
    Indicator { re: &MEDICAL_ACTION_RE, weight: 2, label: "medical-action" },
    Indicator { re: &TEMPORAL_CLINICAL_RE, weight: 1, label: "temporal-marker" },
    Indicator { re: &DEMOGRAPHIC_RE, weight: 1, label: "demographic" },
    Indicator { re: &STRUCTURE_HEADER_RE, weight: 1, label: "document-header" },
];

/// A contiguous range tagged with summed indicator weight.
#[derive(Clone, Debug)]
pub struct ContextWindow {
    pub start: usize,
    pub end: usize,
    pub weight: u32,
    pub strength: ContextStrength,
    pub indicators: Vec<&'static str>,
}

/// Per-document, immutable context map. Pure and cacheable.
pub struct ContextMap {
    windows: Vec<ContextWindow>,
    profile: DocumentProfile,
}

impl ContextMap {
    pub fn build(text: &str) -> Self {
        // (position, weight, label) for every indicator hit.
        let mut hits: Vec<(usize, usize, u32, &'static str)> = Vec::new();
        for ind in INDICATORS {
            for m in ind.re.find_iter(text) {
                hits.push((m.start(), m.end(), ind.weight, ind.label));
            }
        }
        hits.sort_by_key(|&(start, end, _, _)| (start, end));

        // Merge hits whose influence ranges touch into windows, summing weight.
        let mut windows: Vec<ContextWindow> = Vec::new();
        for (start, end, weight, label) in hits {
            let lo = start.saturating_sub(INDICATOR_RADIUS);
            let hi = (end + INDICATOR_RADIUS).min(text.len());
            match windows.last_mut() {
                Some(last) if lo <= last.end => {
                    last.end = last.end.max(hi);
                    last.weight += weight;
                    if !last.indicators.contains(&label) {
                        last.indicators.push(label);
                    }
                }
                _ => windows.push(ContextWindow {
                    start: lo,
                    end: hi,
                    weight,
                    strength: ContextStrength::None,
                    indicators: vec![label],
                }),
            }
        }
        for w in &mut windows {
            w.strength = ContextStrength::from_weight(w.weight);
        }

        ContextMap {
            windows,
            profile: DocumentProfile::classify(text),
        }
    }

    pub fn profile(&self) -> DocumentProfile {
        self.profile
    }

    /// Strongest context overlapping `[pos, pos + len)`.
    pub fn strength_at(&self, pos: usize, len: usize) -> ContextStrength {
        let end = pos + len.max(1);
        let mut best = ContextStrength::None;
        // Binary search to the first window that could overlap, then walk.
        let idx = self.windows.partition_point(|w| w.end <= pos);
        for w in &self.windows[idx..] {
            if w.start >= end {
                break;
            }
            best = best.max(w.strength);
        }
        best
    }

    /// Indicator labels of the strongest window overlapping the range, for
    /// the explanation report.
    pub fn indicators_at(&self, pos: usize, len: usize) -> Vec<&'static str> {
        let end = pos + len.max(1);
        let idx = self.windows.partition_point(|w| w.end <= pos);
        let mut best: Option<&ContextWindow> = None;
        for w in &self.windows[idx..] {
            if w.start >= end {
                break;
            }
            if best.map(|b| w.strength > b.strength).unwrap_or(true) {
                best = Some(w);
            }
        }
        best.map(|w| w.indicators.clone()).unwrap_or_default()
    }

    pub fn boost_at(&self, pos: usize, len: usize) -> f64 {
        self.strength_at(pos, len).boost()
    }
}

// =============================================================================
// Document profile
// =============================================================================

/// Coarse structural classification used to select confidence thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentProfile {
    Form,
    Narrative,
    Table,
    List,
    Mixed,
    Unknown,
}

static LABEL_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[A-Za-z][A-Za-z /#.()-]{0,30}:").expect("label line re"));
static BULLET_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+\.)\s+").expect("bullet line re"));
static COLUMN_GAP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S {3,}\S").expect("column gap re"));

impl DocumentProfile {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentProfile::Form => "FORM",
            DocumentProfile::Narrative => "NARRATIVE",
            DocumentProfile::Table => "TABLE",
            DocumentProfile::List => "LIST",
            DocumentProfile::Mixed => "MIXED",
            DocumentProfile::Unknown => "UNKNOWN",
        }
    }

    pub fn classify(text: &str) -> DocumentProfile {
        let mut total = 0usize;
        let mut label_lines = 0usize;
        let mut bullet_lines = 0usize;
        let mut table_lines = 0usize;
        let mut prose_lines = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            total += 1;
            if line.contains('|') || COLUMN_GAP_RE.find_iter(line).count() >= 2 {
                table_lines += 1;
            } else if BULLET_LINE_RE.is_match(line) {
                bullet_lines += 1;
            } else if LABEL_LINE_RE.is_match(line) {
                label_lines += 1;
            } else if trimmed.split_whitespace().count() >= 8 {
                prose_lines += 1;
            }
        }

        if total == 0 {
            return DocumentProfile::Unknown;
        }
        let ratio = |n: usize| n as f64 / total as f64;
        let dominant = [
            (DocumentProfile::Table, ratio(table_lines)),
            (DocumentProfile::List, ratio(bullet_lines)),
            (DocumentProfile::Form, ratio(label_lines)),
            (DocumentProfile::Narrative, ratio(prose_lines)),
        ];

        let strong: Vec<_> = dominant.iter().filter(|(_, r)| *r >= 0.25).collect();
        match strong.len() {
            0 => DocumentProfile::Unknown,
            1 => strong[0].0,
            _ => {
                // A single clearly-dominant class still wins over scattered
                // runners-up.
                let mut sorted = dominant;
                sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
                if sorted[0].1 >= 2.0 * sorted[1].1 {
                    sorted[0].0
                } else {
                    DocumentProfile::Mixed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_context() {
        let map = ContextMap::build("");
        assert_eq!(map.strength_at(0, 1), ContextStrength::None);
        assert_eq!(map.profile(), DocumentProfile::Unknown);
    }

    #[test]
    fn patient_label_produces_strong_context_nearby() {
        let doc = "Patient: John Smith was admitted and complains of chest pain.";
        let map = ContextMap::build(doc);
        // Label (3) + admitted (2) + complains of (2) all within one window.
        assert_eq!(map.strength_at(9, 10), ContextStrength::Strong);
        assert!(map.boost_at(9, 10) > 0.14);
        assert!(map.indicators_at(9, 10).contains(&"patient-label"));
    }

    #[test]
    fn distant_text_is_outside_the_window() {
        let mut doc = String::from("Patient: John Smith.");
        doc.push_str(&" filler".repeat(100));
        doc.push_str(" trailing words with no indicators at all");
        let map = ContextMap::build(&doc);
        let far = doc.len() - 10;
        assert_eq!(map.strength_at(far, 5), ContextStrength::None);
    }

    #[test]
    fn single_weak_indicator_is_weak() {
        let doc = "follow-up scheduled for the garden club meeting";
        let map = ContextMap::build(doc);
        assert_eq!(map.strength_at(0, 9), ContextStrength::Weak);
    }

    #[test]
    fn form_profile() {
        let doc = "Name: X\nDOB: Y\nMRN: Z\nPhone: W\n";
        assert_eq!(DocumentProfile::classify(doc), DocumentProfile::Form);
    }

    #[test]
    fn narrative_profile() {
        let doc = "The quick brown fox jumped over the lazy dog near the river today.\n\
                   It then ran far away into the woods and was never seen again after.\n";
        assert_eq!(DocumentProfile::classify(doc), DocumentProfile::Narrative);
    }

    #[test]
    fn list_profile() {
        let doc = "- first item here\n- second item here\n- third item here\n";
        assert_eq!(DocumentProfile::classify(doc), DocumentProfile::List);
    }
}
