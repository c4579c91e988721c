//! Filter framework: one detector per PHI category (several where
//! precision/recall tradeoffs differ), dispatched through a tagged variant
//! and a static descriptor table. Filters are pure with respect to their
//! inputs and never touch shared mutable state.

pub mod address;
pub mod dates;
pub mod device;
pub mod identifiers;
pub mod names;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::ContextMap;
use crate::span::{FilterType, Span};
use crate::vocab::Vocabulary;

/// Everything a filter may look at. All references are immutable; the OCR
/// shadow text (when present) has the exact byte layout of `text` because
/// the confusable map is ASCII-to-ASCII.
pub struct DetectInput<'a> {
    pub text: &'a str,
    pub ocr_text: Option<&'a str>,
    pub vocab: &'a Vocabulary,
    pub context: &'a ContextMap,
}

impl<'a> DetectInput<'a> {
    /// Scan sources in order: the raw document, then (when OCR tolerance is
    /// on) the confusable-normalized shadow.
    pub fn sources(&self) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.text).chain(self.ocr_text)
    }
}

/// Tagged dispatch over every registered filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Ssn,
    Phone,
    Fax,
    Email,
    Url,
    Ip,
    Zipcode,
    Mrn,
    Npi,
    Dea,
    CreditCard,
    Account,
    License,
    HealthPlan,
    Passport,
    Date,
    RelativeDate,
    Age,
    NamePatterns,
    NameDictionary,
    ContextAwareName,
    Address,
    ContextAwareAddress,
    Hospital,
    Device,
    Vehicle,
    Biometric,
    UniqueId,
}

impl FilterKind {
    pub fn detect(&self, input: &DetectInput) -> Vec<Span> {
        match self {
            FilterKind::Ssn => identifiers::detect_ssn(input),
            FilterKind::Phone => identifiers::detect_phone(input),
            FilterKind::Fax => identifiers::detect_fax(input),
            FilterKind::Email => identifiers::detect_email(input),
            FilterKind::Url => identifiers::detect_url(input),
            FilterKind::Ip => identifiers::detect_ip(input),
            FilterKind::Zipcode => identifiers::detect_zipcode(input),
            FilterKind::Mrn => identifiers::detect_mrn(input),
            FilterKind::Npi => identifiers::detect_npi(input),
            FilterKind::Dea => identifiers::detect_dea(input),
            FilterKind::CreditCard => identifiers::detect_credit_card(input),
            FilterKind::Account => identifiers::detect_account(input),
            FilterKind::License => identifiers::detect_license(input),
            FilterKind::HealthPlan => identifiers::detect_health_plan(input),
            FilterKind::Passport => identifiers::detect_passport(input),
            FilterKind::Date => dates::detect_date(input),
            FilterKind::RelativeDate => dates::detect_relative_date(input),
            FilterKind::Age => dates::detect_age(input),
            FilterKind::NamePatterns => names::detect_name_patterns(input),
            FilterKind::NameDictionary => names::detect_name_dictionary(input),
            FilterKind::ContextAwareName => names::detect_context_name(input),
            FilterKind::Address => address::detect_address(input),
            FilterKind::ContextAwareAddress => address::detect_context_address(input),
            FilterKind::Hospital => address::detect_hospital(input),
            FilterKind::Device => device::detect_device(input),
            FilterKind::Vehicle => device::detect_vehicle(input),
            FilterKind::Biometric => device::detect_biometric(input),
            FilterKind::UniqueId => device::detect_unique_id(input),
        }
    }
}

/// Static description of one registered filter.
pub struct FilterDescriptor {
    pub name: &'static str,
    pub filter_type: FilterType,
    pub priority: u32,
    /// Member of the context-aware family toggled by
    /// `Policy::context_filters_enabled`.
    pub context_family: bool,
    /// Safe to run over slices of one document. Detectors that track state
    /// across a whole document are not.
    pub slice_parallel_safe: bool,
    pub kind: FilterKind,
}

const fn descriptor(
    name: &'static str,
    filter_type: FilterType,
    context_family: bool,
    slice_parallel_safe: bool,
    kind: FilterKind,
) -> FilterDescriptor {
    FilterDescriptor {
        name,
        filter_type,
        priority: filter_type.specificity(),
        context_family,
        slice_parallel_safe,
        kind,
    }
}

static REGISTRY: &[FilterDescriptor] = &[
    descriptor("ssn", FilterType::Ssn, false, true, FilterKind::Ssn),
    descriptor("phone", FilterType::Phone, false, true, FilterKind::Phone),
    descriptor("fax", FilterType::Fax, false, true, FilterKind::Fax),
    descriptor("email", FilterType::Email, false, true, FilterKind::Email),
    descriptor("url", FilterType::Url, false, true, FilterKind::Url),
    descriptor("ip", FilterType::Ip, false, true, FilterKind::Ip),
    descriptor("zipcode", FilterType::Zipcode, false, true, FilterKind::Zipcode),
    descriptor("mrn", FilterType::Mrn, false, true, FilterKind::Mrn),
    descriptor("npi", FilterType::Npi, false, true, FilterKind::Npi),
    descriptor("dea", FilterType::Dea, false, true, FilterKind::Dea),
    descriptor("credit-card", FilterType::CreditCard, false, true, FilterKind::CreditCard),
    descriptor("account", FilterType::Account, false, true, FilterKind::Account),
    descriptor("license", FilterType::License, false, true, FilterKind::License),
    descriptor("health-plan", FilterType::HealthPlan, false, true, FilterKind::HealthPlan),
    descriptor("passport", FilterType::Passport, false, true, FilterKind::Passport),
    descriptor("date", FilterType::Date, false, true, FilterKind::Date),
    descriptor("relative-date", FilterType::RelativeDate, true, false, FilterKind::RelativeDate),
    descriptor("age", FilterType::Age, false, true, FilterKind::Age),
    descriptor("name-patterns", FilterType::Name, false, true, FilterKind::NamePatterns),
    descriptor("name-dictionary", FilterType::Name, false, true, FilterKind::NameDictionary),
    descriptor("context-name", FilterType::Name, true, true, FilterKind::ContextAwareName),
    descriptor("address", FilterType::Address, false, true, FilterKind::Address),
    descriptor("context-address", FilterType::Address, true, true, FilterKind::ContextAwareAddress),
    descriptor("hospital", FilterType::Hospital, false, true, FilterKind::Hospital),
    descriptor("device", FilterType::Device, false, true, FilterKind::Device),
    descriptor("vehicle", FilterType::Vehicle, false, true, FilterKind::Vehicle),
    descriptor("biometric", FilterType::Biometric, false, true, FilterKind::Biometric),
    descriptor("unique-id", FilterType::UniqueId, false, true, FilterKind::UniqueId),
];

/// The full filter set, in registration order. Execution order never affects
/// output: candidates merge into an order-independent multiset.
pub fn registry() -> &'static [FilterDescriptor] {
    REGISTRY
}

// =============================================================================
// Shared scanning plumbing
// =============================================================================

/// One compiled pattern with its provenance id and base confidence.
pub(crate) struct PatternSpec {
    pub id: &'static str,
    pub confidence: f64,
    /// Capture group holding the value; 0 means the whole match.
    pub capture: usize,
    pub re: Regex,
}

pub(crate) fn spec(id: &'static str, confidence: f64, capture: usize, source: &str) -> PatternSpec {
    PatternSpec {
        id,
        confidence,
        capture,
        re: Regex::new(source).unwrap_or_else(|e| panic!("invalid pattern {id}: {e}")),
    }
}

/// Map OCR letter confusables to the digits they were misread from.
/// ASCII-to-ASCII, so byte offsets in the shadow text line up with the
/// original document.
pub(crate) fn ocr_normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        out.push(match ch {
            'O' | 'o' => '0',
            'l' | 'I' | '|' => '1',
            'B' => '8',
            'b' => '6',
            'S' | 's' => '5',
            'Z' | 'z' => '2',
            'G' => '6',
            'g' | 'q' => '9',
            _ => ch,
        });
    }
    out
}

/// Matches an already-substituted placeholder token like `[HEALTH-PLAN]`.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[A-Z][A-Z-]*\]$").expect("placeholder re"));

/// True when the byte range sits inside a placeholder token from a previous
/// redaction pass. Keeps `redact` idempotent on its own output.
pub(crate) fn inside_placeholder(text: &str, start: usize, end: usize) -> bool {
    let open = text[..start].rfind('[');
    let close = text[end..].find(']').map(|i| end + i);
    match (open, close) {
        (Some(o), Some(c)) => PLACEHOLDER_RE.is_match(&text[o..=c.min(text.len() - 1)]),
        _ => false,
    }
}

/// Consistency-token braces from upstream templating are never candidates.
pub(crate) fn is_templated(text: &str) -> bool {
    text.contains("{{") || text.contains("}}")
}

pub(crate) fn prev_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx > text.len() {
        idx = text.len();
    }
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

pub(crate) fn next_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx > text.len() {
        idx = text.len();
    }
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Case-insensitive keyword search in a byte window around a match.
pub(crate) fn keyword_nearby(
    text: &str,
    start: usize,
    len: usize,
    radius: usize,
    keywords: &[&str],
) -> bool {
    let lo = prev_char_boundary(text, start.saturating_sub(radius));
    let hi = next_char_boundary(text, (start + len + radius).min(text.len()));
    let window = text[lo..hi].to_ascii_lowercase();
    keywords.iter().any(|k| window.contains(k))
}

/// Run a pattern list over the raw document only. Most detectors must not
/// see the OCR shadow: letter-to-digit folding turns ordinary words into
/// digit runs that would light up ZIP/account/passport patterns.
pub(crate) fn scan_specs(
    input: &DetectInput,
    filter_type: FilterType,
    specs: &[PatternSpec],
    accept: impl FnMut(&str, &str, usize) -> bool,
) -> Vec<Span> {
    scan_sources(input, std::iter::once(input.text), filter_type, specs, accept)
}

/// Like [`scan_specs`] but also runs the confusable-normalized shadow pass.
/// Reserved for the digit-shaped categories (SSN, phone, fax, date) where
/// OCR misreads are worth recovering.
pub(crate) fn scan_specs_ocr(
    input: &DetectInput,
    filter_type: FilterType,
    specs: &[PatternSpec],
    accept: impl FnMut(&str, &str, usize) -> bool,
) -> Vec<Span> {
    scan_sources(input, input.sources(), filter_type, specs, accept)
}

/// Shared scan: dedupe by byte range, validate, and emit spans. Span text
/// always comes from the original document even when the match landed on
/// the OCR shadow (the shadow has identical byte layout).
fn scan_sources<'a>(
    input: &DetectInput<'a>,
    sources: impl Iterator<Item = &'a str>,
    filter_type: FilterType,
    specs: &[PatternSpec],
    mut accept: impl FnMut(&str, &str, usize) -> bool,
) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for source in sources {
        for pattern in specs {
            for caps in pattern.re.captures_iter(source) {
                let full = match caps.get(0) {
                    Some(m) => m,
                    None => continue,
                };
                let m = if pattern.capture == 0 {
                    full
                } else {
                    match caps.get(pattern.capture) {
                        Some(g) => g,
                        None => continue,
                    }
                };
                if !seen.insert((m.start(), m.end())) {
                    continue;
                }
                if is_templated(full.as_str()) {
                    continue;
                }
                if inside_placeholder(input.text, m.start(), m.end()) {
                    continue;
                }
                if !accept(m.as_str(), full.as_str(), m.start()) {
                    continue;
                }
                let original = &input.text[m.start()..m.end()];
                out.push(Span::detected(
                    filter_type,
                    m.start(),
                    m.end(),
                    original,
                    pattern.confidence,
                    pattern.id,
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextMap;
    use crate::vocab::Vocabulary;

    pub(crate) fn run(kind: FilterKind, text: &str) -> Vec<Span> {
        let vocab = Vocabulary::builtin();
        let ctx = ContextMap::build(text);
        let input = DetectInput {
            text,
            ocr_text: None,
            vocab: &vocab,
            context: &ctx,
        };
        kind.detect(&input)
    }

    #[test]
    fn registry_covers_every_family() {
        let reg = registry();
        assert!(reg.len() >= 25);
        assert!(reg.iter().any(|d| d.filter_type == FilterType::Ssn));
        assert!(reg.iter().filter(|d| d.filter_type == FilterType::Name).count() >= 3);
        assert!(reg.iter().any(|d| d.context_family));
        assert!(reg.iter().any(|d| !d.slice_parallel_safe));
    }

    #[test]
    fn ocr_normalize_preserves_byte_layout() {
        let raw = "SSN l23-45-67B9 done";
        let shadow = ocr_normalize(raw);
        assert_eq!(raw.len(), shadow.len());
        assert!(shadow.contains("123-45-6789"));
    }

    #[test]
    fn placeholder_guard() {
        let text = "Patient [NAME] DOB [DATE]";
        let start = text.find("NAME").unwrap();
        assert!(inside_placeholder(text, start, start + 4));
        let plain = "Patient NAME DOB";
        let start = plain.find("NAME").unwrap();
        assert!(!inside_placeholder(plain, start, start + 4));
    }

    #[test]
    fn keyword_window_is_bounded() {
        let text = "insurance member id AB123456 listed";
        let pos = text.find("AB123456").unwrap();
        assert!(keyword_nearby(text, pos, 8, 40, &["insurance"]));
        assert!(!keyword_nearby(text, pos, 8, 5, &["insurance"]));
    }
}
