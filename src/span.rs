//! Span model: the central entity flowing through the detection pipeline.
//!
//! A span is created by exactly one filter, mutated only by the resolver
//! (winner marking) and the calibrator (confidence adjustment), and dropped
//! with the request. Offsets are half-open byte offsets into the source
//! document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Closed set of HIPAA Safe Harbor identifier categories.
///
/// Dispatch over filters is keyed on this tag; there is no trait-object
/// filter hierarchy on the hot path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    Name,
    Date,
    RelativeDate,
    Ssn,
    Phone,
    Fax,
    Email,
    Address,
    Zipcode,
    Mrn,
    Npi,
    HealthPlan,
    Account,
    License,
    Dea,
    Passport,
    CreditCard,
    Ip,
    Url,
    Device,
    Vehicle,
    Biometric,
    Age,
    Hospital,
    UniqueId,
    Custom,
}

impl FilterType {
    /// Every variant, in report order.
    pub const ALL: &'static [FilterType] = &[
        FilterType::Name,
        FilterType::Date,
        FilterType::RelativeDate,
        FilterType::Ssn,
        FilterType::Phone,
        FilterType::Fax,
        FilterType::Email,
        FilterType::Address,
        FilterType::Zipcode,
        FilterType::Mrn,
        FilterType::Npi,
        FilterType::HealthPlan,
        FilterType::Account,
        FilterType::License,
        FilterType::Dea,
        FilterType::Passport,
        FilterType::CreditCard,
        FilterType::Ip,
        FilterType::Url,
        FilterType::Device,
        FilterType::Vehicle,
        FilterType::Biometric,
        FilterType::Age,
        FilterType::Hospital,
        FilterType::UniqueId,
        FilterType::Custom,
    ];

    /// Stable uppercase label used in reports and policy files.
    pub fn label(&self) -> &'static str {
        match self {
            FilterType::Name => "NAME",
            FilterType::Date => "DATE",
            FilterType::RelativeDate => "RELATIVE_DATE",
            FilterType::Ssn => "SSN",
            FilterType::Phone => "PHONE",
            FilterType::Fax => "FAX",
            FilterType::Email => "EMAIL",
            FilterType::Address => "ADDRESS",
            FilterType::Zipcode => "ZIPCODE",
            FilterType::Mrn => "MRN",
            FilterType::Npi => "NPI",
            FilterType::HealthPlan => "HEALTH_PLAN",
            FilterType::Account => "ACCOUNT",
            FilterType::License => "LICENSE",
            FilterType::Dea => "DEA",
            FilterType::Passport => "PASSPORT",
            FilterType::CreditCard => "CREDIT_CARD",
            FilterType::Ip => "IP",
            FilterType::Url => "URL",
            FilterType::Device => "DEVICE",
            FilterType::Vehicle => "VEHICLE",
            FilterType::Biometric => "BIOMETRIC",
            FilterType::Age => "AGE",
            FilterType::Hospital => "HOSPITAL",
            FilterType::UniqueId => "UNIQUE_ID",
            FilterType::Custom => "CUSTOM",
        }
    }

    /// Parse a policy-file label. Case-insensitive.
    pub fn from_label(label: &str) -> Option<FilterType> {
        let upper = label.trim().to_ascii_uppercase();
        FilterType::ALL.iter().copied().find(|ft| ft.label() == upper)
    }

    /// Default placeholder token: `[TYPE-UPPERCASE-WITH-HYPHENS]`.
    pub fn placeholder(&self) -> String {
        format!("[{}]", self.label().replace('_', "-"))
    }

    /// Fixed specificity ranking used by the overlap resolver.
    ///
    /// Structured types beat generic types beat the catch-all. The table is
    /// part of the resolver contract: changing a value changes which of two
    /// overlapping detections survives.
    pub const fn specificity(&self) -> u32 {
        match self {
            FilterType::Ssn => 100,
            FilterType::Mrn => 95,
            FilterType::CreditCard | FilterType::Npi => 90,
            FilterType::Dea => 88,
            FilterType::Account
            | FilterType::License
            | FilterType::Passport
            | FilterType::HealthPlan => 85,
            FilterType::Email => 80,
            FilterType::Phone | FilterType::Fax | FilterType::Ip | FilterType::Url => 75,
            FilterType::Vehicle | FilterType::Device | FilterType::Biometric => 70,
            FilterType::UniqueId => 65,
            FilterType::Date => 60,
            FilterType::Zipcode => 55,
            FilterType::Address => 50,
            FilterType::Hospital => 45,
            FilterType::Age | FilterType::RelativeDate => 40,
            FilterType::Name => 35,
            FilterType::Custom => 20,
        }
    }

    /// Default filter priority for spans of this type. Individual patterns
    /// may override, but most inherit this.
    pub const fn default_priority(&self) -> u32 {
        self.specificity()
    }
}

/// A single candidate or applied redaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Span {
    /// Original matched substring.
    pub text: String,
    /// Half-open byte offset range into the source document.
    pub start: usize,
    pub end: usize,
    pub filter_type: FilterType,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Higher = more specific category.
    pub priority: u32,
    /// Identifier of the regex/rule that produced the span, if any.
    pub pattern: Option<String>,
    /// Produced via dictionary lookup.
    pub dictionary_hit: bool,
    /// 2-4 surrounding tokens each side, captured at detection time.
    pub window: Vec<String>,
    /// Alternative types this range was also matched as.
    pub ambiguous_with: BTreeSet<FilterType>,
    /// Set once the span survived resolution + pruning and produced output.
    pub applied: bool,
    /// Detected by a filter whose type the policy disabled; kept for the
    /// report, never applied.
    pub ignored: bool,
    /// Placeholder substituted at application time.
    pub replacement: Option<String>,
}

impl Span {
    /// Construct a fresh candidate as filters do. The caller supplies the
    /// matched byte range and text; everything downstream is defaulted.
    pub fn detected(
        filter_type: FilterType,
        start: usize,
        end: usize,
        text: impl Into<String>,
        confidence: f64,
        pattern: &str,
    ) -> Self {
        Span {
            text: text.into(),
            start,
            end,
            filter_type,
            confidence,
            priority: filter_type.default_priority(),
            pattern: Some(pattern.to_string()),
            dictionary_hit: false,
            window: Vec::new(),
            ambiguous_with: BTreeSet::new(),
            applied: false,
            ignored: false,
            replacement: None,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Capture up to `n` whitespace tokens on each side of the span and store
    /// them as the explanation window.
    pub fn capture_window(&mut self, doc: &str, n: usize) {
        let before = &doc[..self.start.min(doc.len())];
        let after = &doc[self.end.min(doc.len())..];

        let mut window: Vec<String> = before
            .split_whitespace()
            .rev()
            .take(n)
            .map(|t| t.to_string())
            .collect();
        window.reverse();
        window.extend(after.split_whitespace().take(n).map(|t| t.to_string()));
        self.window = window;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for ft in FilterType::ALL {
            assert_eq!(FilterType::from_label(ft.label()), Some(*ft));
        }
        assert_eq!(
            FilterType::from_label("health_plan"),
            Some(FilterType::HealthPlan)
        );
        assert_eq!(FilterType::from_label("NO_SUCH_TYPE"), None);
    }

    #[test]
    fn placeholder_uses_hyphens() {
        assert_eq!(FilterType::Ssn.placeholder(), "[SSN]");
        assert_eq!(FilterType::HealthPlan.placeholder(), "[HEALTH-PLAN]");
        assert_eq!(FilterType::CreditCard.placeholder(), "[CREDIT-CARD]");
    }

    #[test]
    fn structured_types_outrank_generic() {
        assert!(FilterType::Ssn.specificity() > FilterType::Name.specificity());
        assert!(FilterType::Name.specificity() > FilterType::Custom.specificity());
        assert!(FilterType::Email.specificity() > FilterType::Age.specificity());
    }

    #[test]
    fn overlap_and_containment() {
        let a = Span::detected(FilterType::Name, 0, 10, "0123456789", 0.9, "t");
        let b = Span::detected(FilterType::Ssn, 5, 15, "...", 0.9, "t");
        let c = Span::detected(FilterType::Ssn, 10, 15, "...", 0.9, "t");
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let inner = Span::detected(FilterType::Ssn, 2, 8, "...", 0.9, "t");
        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
    }

    #[test]
    fn window_capture_is_bounded() {
        let doc = "alpha beta gamma TARGET delta epsilon zeta";
        let start = doc.find("TARGET").unwrap();
        let mut s = Span::detected(FilterType::Name, start, start + 6, "TARGET", 0.9, "t");
        s.capture_window(doc, 2);
        assert_eq!(s.window, vec!["beta", "gamma", "delta", "epsilon"]);
    }
}
