//! Date, relative-date, and age detectors.
//!
//! Ages below 90 are suppressed here at the filter, never emitted, so the
//! report only ever counts spans that are actually PHI. The age span covers
//! the number alone; surrounding words ("years old") stay in the document.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::ContextStrength;
use crate::filters::{inside_placeholder, scan_specs, scan_specs_ocr, spec, DetectInput, PatternSpec};
use crate::span::{FilterType, Span};

// =============================================================================
// DATE
// =============================================================================

static DATE_LABELED_DOB: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "date-dob",
        0.97,
        1,
        r"(?i)\b(?:dob|d\.o\.b\.|date\s+of\s+birth)[:\s#-]*((?:0?[1-9]|1[0-2])[./-](?:0?[1-9]|[12]\d|3[01])[./-](?:\d{2}|(?:19|20)\d{2}))\b",
    )]
});

static DATE_NUMERIC: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "date-us",
            0.95,
            0,
            r"\b(0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])[-/]((?:19|20)\d{2})\b",
        ),
        spec(
            "date-us-short-year",
            0.92,
            0,
            r"\b(0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])[-/](\d{2})\b",
        ),
        spec(
            "date-iso",
            0.95,
            0,
            r"\b((?:19|20)\d{2})[-/](0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])\b",
        ),
    ]
});

static DATE_TEXTUAL: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "date-month-dmy",
            0.95,
            0,
            r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?,?\s+(?:19|20)\d{2}\b",
        ),
        spec(
            "date-month-mdy",
            0.95,
            0,
            r"(?i)\b(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+(?:19|20)\d{2}\b",
        ),
        spec(
            "date-military",
            0.92,
            0,
            r"(?i)\b(?:[0-2]?[0-9]|3[01])(?:JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)(?:19|20)\d{2}\b",
        ),
        spec(
            "date-contextual-year",
            0.85,
            1,
            r"(?i)\b(?:born|admitted|discharged|diagnosed|since)\s+((?:19|20)\d{2})\b",
        ),
    ]
});

static DATE_GENERIC: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "date-generic-numeric",
        0.8,
        0,
        r"\b\d{1,4}[-/]\d{1,4}[-/]\d{1,4}\b",
    )]
});

const DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn plausible_month_day(month: u32, day: u32) -> bool {
    (1..=12).contains(&month) && day >= 1 && day <= DAYS_IN_MONTH[(month - 1) as usize]
}

/// A generic `a-b-c` numeric triple is a date only if some arrangement of
/// its components forms a plausible month/day plus a year-like part.
fn plausible_generic_date(value: &str) -> bool {
    let parts: Vec<u32> = value
        .split(['-', '/'])
        .filter_map(|p| p.parse().ok())
        .collect();
    if parts.len() != 3 {
        return false;
    }
    let (a, b, c) = (parts[0], parts[1], parts[2]);
    let year_like = |n: u32| n <= 99 || (1900..=2099).contains(&n);
    // MDY, DMY, YMD in that order.
    (plausible_month_day(a, b) && year_like(c))
        || (plausible_month_day(b, a) && year_like(c))
        || (year_like(a) && plausible_month_day(b, c))
}

fn numeric_date_ok(value: &str) -> bool {
    let parts: Vec<&str> = value.split(['-', '/']).collect();
    if parts.len() != 3 {
        return false;
    }
    let nums: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    if nums.len() != 3 {
        return false;
    }
    // Leading 4-digit part means ISO ordering.
    if parts[0].len() == 4 {
        plausible_month_day(nums[1], nums[2])
    } else {
        plausible_month_day(nums[0], nums[1])
    }
}

pub fn detect_date(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs_ocr(input, FilterType::Date, &DATE_LABELED_DOB, |value, _, _| {
        numeric_date_ok(value)
    });
    out.extend(scan_specs_ocr(input, FilterType::Date, &DATE_NUMERIC, |value, _, _| {
        numeric_date_ok(value)
    }));
    out.extend(scan_specs(input, FilterType::Date, &DATE_TEXTUAL, |_, _, _| true));
    out.extend(scan_specs_ocr(input, FilterType::Date, &DATE_GENERIC, |value, _, _| {
        plausible_generic_date(value)
    }));
    out
}

// =============================================================================
// RELATIVE DATE (context-aware family)
// =============================================================================

static RELATIVE_DATE_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "relative-day",
            0.88,
            0,
            r"(?i)\b(?:last|next|this|past|previous|coming|upcoming)\s+(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        ),
        spec(
            "relative-ago",
            0.9,
            0,
            r"(?i)\b(?:\d+\s+(?:days?|weeks?|months?|years?)\s+ago|in\s+\d+\s+(?:days?|weeks?|months?))\b",
        ),
        spec(
            "relative-keyword",
            0.92,
            0,
            r"(?i)\b(?:yesterday|tomorrow|day\s+before\s+yesterday|day\s+after\s+tomorrow)\b",
        ),
        spec(
            "relative-period",
            0.89,
            0,
            r"(?i)\b(?:last|next|past|previous|coming)\s+(?:week|month|year|quarter)\b",
        ),
    ]
});

/// Relative expressions identify an individual only inside clinical
/// narrative; without at least MODERATE context they are not emitted.
pub fn detect_relative_date(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::RelativeDate, &RELATIVE_DATE_PATTERNS, |_, full, start| {
        input.context.strength_at(start, full.len()) >= ContextStrength::Moderate
    })
}

// =============================================================================
// AGE (>= 90 only; Safe Harbor aggregation rule)
// =============================================================================

static AGE_NUMBER_ONLY: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "age-explicit",
            0.96,
            1,
            r"(?i)\b(9\d|1[0-2]\d)\s*(?:years?\s+old|y\.?o\.?\b|yr\.?s?\s+old|years?\s+of\s+age)",
        ),
        spec(
            "age-compound",
            0.96,
            1,
            r"(?i)\b(9\d|1[0-2]\d)[-–]year[-–]old\b",
        ),
        spec("age-labeled", 0.95, 1, r"(?i)\b(?:aged?)\s*[:#]?\s*(9\d|1[0-2]\d)\b"),
        spec(
            "age-field",
            0.97,
            1,
            r"(?i)\b(?:patient\s+)?age\s*[:\-=]\s*(9\d|1[0-2]\d)\b",
        ),
    ]
});

static AGE_PHRASE: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "age-ordinal-decade",
            0.92,
            0,
            r"(?i)\b(?:in\s+)?(?:his|her|their|the)\s+(?:early\s+|mid[- ]?|late\s+)?(?:90|100|110)s\b",
        ),
        spec("age-demographic", 0.92, 0, r"\b(9\d|1[0-2]\d)\s*(?:[MF]|Male|Female)\b"),
    ]
});

static AGE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{2,3})\s*(?:-|–|to)\s*(\d{2,3})\s*(?:years?\s+old|years?|y\.?o\.?)\b")
        .expect("age range re")
});

fn age_in_band(value: &str) -> bool {
    value.parse::<u32>().map(|a| (90..=125).contains(&a)).unwrap_or(false)
}

pub fn detect_age(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Age, &AGE_NUMBER_ONLY, |value, _, _| {
        age_in_band(value)
    });
    out.extend(scan_specs(input, FilterType::Age, &AGE_PHRASE, |_, full, _| {
        // Demographic form carries the number in the full match.
        full.chars().next().map(|c| !c.is_ascii_digit()).unwrap_or(true)
            || age_in_band(
                &full
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>(),
            )
    }));

    // Ranges redact when either endpoint reaches the band.
    for caps in AGE_RANGE_RE.captures_iter(input.text) {
        let m = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let lo = caps.get(1).and_then(|g| g.as_str().parse::<u32>().ok()).unwrap_or(0);
        let hi = caps.get(2).and_then(|g| g.as_str().parse::<u32>().ok()).unwrap_or(0);
        if lo.max(hi) < 90 || lo.max(hi) > 125 {
            continue;
        }
        if inside_placeholder(input.text, m.start(), m.end()) {
            continue;
        }
        if out.iter().any(|s| s.start == m.start() && s.end == m.end()) {
            continue;
        }
        out.push(Span::detected(
            FilterType::Age,
            m.start(),
            m.end(),
            m.as_str(),
            0.94,
            "age-range",
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use crate::filters::FilterKind;

    #[test]
    fn us_and_iso_dates_detected() {
        let spans = run(FilterKind::Date, "seen 01/15/1990 and 2021-03-07 twice");
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert!(texts.contains(&"01/15/1990"));
        assert!(texts.contains(&"2021-03-07"));
    }

    #[test]
    fn impossible_dates_rejected() {
        assert!(run(FilterKind::Date, "noted 02/30/2020 here").is_empty());
        assert!(run(FilterKind::Date, "noted 13/45/2020 here").is_empty());
    }

    #[test]
    fn day_first_date_is_plausible() {
        // 13/10/2020 only parses day-first; the generic pattern keeps it.
        let spans = run(FilterKind::Date, "noted 13/10/2020 here");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn textual_dates_detected() {
        let spans = run(FilterKind::Date, "admitted January 5th, 2019 and 3 March 2020");
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn dob_label_captures_value_only() {
        let spans = run(FilterKind::Date, "DOB: 01/15/1990 noted");
        assert!(spans.iter().any(|s| s.text == "01/15/1990"));
        assert!(spans.iter().all(|s| !s.text.to_lowercase().contains("dob")));
    }

    #[test]
    fn relative_dates_need_clinical_context() {
        assert!(run(FilterKind::RelativeDate, "see you next Tuesday").is_empty());
        let spans = run(
            FilterKind::RelativeDate,
            "Patient: admitted and discharged, complains of pain since last Tuesday",
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "last Tuesday");
    }

    #[test]
    fn age_ninety_plus_number_only() {
        let spans = run(FilterKind::Age, "The patient is 94 years old.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "94");
    }

    #[test]
    fn age_below_ninety_never_emitted() {
        assert!(run(FilterKind::Age, "The patient is 62 years old.").is_empty());
        assert!(run(FilterKind::Age, "Age: 89").is_empty());
    }

    #[test]
    fn age_field_and_compound() {
        assert_eq!(run(FilterKind::Age, "Patient Age: 92")[0].text, "92");
        assert_eq!(run(FilterKind::Age, "a 93-year-old woman")[0].text, "93");
    }

    #[test]
    fn age_range_spans_whole_range() {
        // The explicit form also fires on the upper endpoint; the resolver
        // keeps the longer range span downstream.
        let spans = run(FilterKind::Age, "cohort of 90-95 years");
        assert!(spans.iter().any(|s| s.text == "90-95 years"));
        assert!(run(FilterKind::Age, "cohort of 60-75 years").is_empty());
    }

    #[test]
    fn ordinal_decade_detected() {
        let spans = run(FilterKind::Age, "she is in her early 90s now");
        assert_eq!(spans.len(), 1);
    }
}
