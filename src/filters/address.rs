//! Geographic detectors: street addresses, highway references, contextual
//! city mentions, and healthcare facility names.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::ContextStrength;
use crate::filters::{inside_placeholder, scan_specs, spec, DetectInput, PatternSpec};
use crate::span::{FilterType, Span};

const STREET_SUFFIXES: &[&str] = &[
    "street", "st", "avenue", "ave", "road", "rd", "drive", "dr", "boulevard", "blvd", "lane",
    "ln", "way", "court", "ct", "circle", "cir", "place", "pl", "terrace", "ter", "parkway",
    "pkwy", "highway", "hwy", "trail", "plaza",
];

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

static ADDRESS_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    let suffixes = STREET_SUFFIXES.join("|");
    let states = US_STATES.join("|");
    vec![
        spec("address-po-box", 0.85, 0, r"(?i)\b(?:P\.?O\.?\s*Box|POB)\s+\d+\b"),
        spec(
            "address-street",
            0.85,
            0,
            &format!(
                r"(?i)\b\d+\s+[A-Z][a-z']+(?:\s+[A-Z][a-z']+)*\s+(?:{suffixes})\b(?:\s*,?\s*(?:Apt|Suite|Unit|Ste|#)\s*[A-Z0-9]+)?",
            ),
        ),
        spec(
            "address-labeled",
            0.88,
            1,
            &format!(
                r"(?i)(?:Home\s+)?Address:\s*(\d+\s+[A-Z][a-z']+(?:\s+[A-Z][a-z']+)*\s+(?:{suffixes}))",
            ),
        ),
        spec(
            "address-city-state-zip",
            0.85,
            0,
            &format!(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s*(?:{states})\s+\d{{5}}(?:-\d{{4}})?\b"),
        ),
        spec(
            "address-highway",
            0.9,
            0,
            r"(?i)\b(?:Highway|Hwy|Interstate|I-|US-|State\s+Route|SR-|County\s+Road|CR-)\s*\d{1,4}[A-Z]?\b",
        ),
    ]
});

pub fn detect_address(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Address, &ADDRESS_PATTERNS, |_, _, _| true)
}

// =============================================================================
// Contextual city mentions (context-aware family)
// =============================================================================

static CONTEXT_CITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:near|in|at|from|outside|downtown|suburb of|resident of|lives in|living in|moved to|relocated to)\s+([A-Z][a-z]{2,}(?:\s+[A-Z][a-z]+)?)\b")
        .expect("context city re")
});

/// City mentions only redact when the city is in the dictionary and the
/// mention sits inside clinical context.
pub fn detect_context_address(input: &DetectInput) -> Vec<Span> {
    let text = input.text;
    let mut out: Vec<Span> = Vec::new();

    for caps in CONTEXT_CITY_RE.captures_iter(text) {
        let m = match caps.get(1) {
            Some(m) => m,
            None => continue,
        };
        let city = m.as_str();
        if input.context.strength_at(m.start(), m.len()) < ContextStrength::Moderate {
            continue;
        }
        if input.vocab.cities.lookup(city).is_none() {
            continue;
        }
        if inside_placeholder(text, m.start(), m.end()) {
            continue;
        }
        out.push(Span::detected(
            FilterType::Address,
            m.start(),
            m.end(),
            city,
            0.75,
            "contextual-city",
        ));
    }

    out
}

// =============================================================================
// Healthcare facility names
// =============================================================================

static HOSPITAL_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "hospital-facility",
            0.9,
            0,
            r"\b[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+){0,3}\s+(?:Hospital|Medical\s+Center|Health\s+Center|Healthcare|Clinic|Memorial)\b",
        ),
        spec(
            "hospital-saint",
            0.92,
            0,
            r"\b(?:St\.?|Saint|Mount|Mt\.?)\s+[A-Z][A-Za-z]+(?:'s)?\s+(?:Hospital|Medical\s+Center|Health|Clinic|Memorial)\b",
        ),
        spec(
            "hospital-labeled",
            0.94,
            1,
            r"(?i)\b(?:hospital|facility|institution)\s*[:#]\s*([A-Z][A-Za-z ]+(?:Hospital|Medical|Health|Clinic|Memorial|Center))\b",
        ),
    ]
});

pub fn detect_hospital(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Hospital, &HOSPITAL_PATTERNS, |_, _, _| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use crate::filters::FilterKind;

    #[test]
    fn street_address_detected() {
        let spans = run(FilterKind::Address, "lives at 412 Maple Street, Apt 4B");
        assert!(!spans.is_empty());
        assert!(spans[0].text.starts_with("412 Maple Street"));
    }

    #[test]
    fn po_box_and_city_state_zip() {
        let spans = run(FilterKind::Address, "Mail to P.O. Box 1142, Boulder, CO 80301");
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert!(texts.iter().any(|t| t.contains("Box 1142")));
        assert!(texts.iter().any(|t| t.contains("Boulder, CO 80301")));
    }

    #[test]
    fn highway_reference() {
        let spans = run(FilterKind::Address, "crash on Highway 36 ramp");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Highway 36");
    }

    #[test]
    fn contextual_city_needs_context_and_dictionary() {
        assert!(run(FilterKind::ContextAwareAddress, "she lives in Boston now").is_empty());
        let spans = run(
            FilterKind::ContextAwareAddress,
            "Patient: admitted yesterday, complains of pain, lives in Boston currently",
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Boston");
    }

    #[test]
    fn unknown_city_not_flagged() {
        assert!(run(
            FilterKind::ContextAwareAddress,
            "Patient: admitted yesterday, complains of pain, lives in Zzyzxville currently",
        )
        .is_empty());
    }

    #[test]
    fn hospital_names() {
        let spans = run(FilterKind::Hospital, "transferred to Boulder Community Hospital");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Boulder Community Hospital");
        let spans = run(FilterKind::Hospital, "at St. Mary's Hospital overnight");
        assert_eq!(spans.len(), 1);
    }
}
