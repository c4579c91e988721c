//! Post-detection false-positive pruning.
//!
//! A chain of independent predicates runs over the resolver's survivors.
//! Each strategy is locally scoped; chain order only decides which strategy
//! gets credited in the report when several would drop the same span.
//! Every predicate is dominated by hash-set lookups.

use crate::span::{FilterType, Span};
use crate::vocab::Vocabulary;

/// A span removed by the pruner, with the strategy that claimed it.
pub struct PrunedSpan {
    pub span: Span,
    pub strategy: &'static str,
}

static INVALID_STARTS: &[&str] = &[
    "The ", "A ", "An ", "To ", "From ", "In ", "On ", "At ", "Is ", "Was ", "Are ", "By ",
    "For ", "With ", "As ", "All ", "No ", "Not ", "And ", "Or ", "But ", "Home ", "Work ",
    "Cell ", "Fax ", "Email ", "Blood ", "Heart ", "Vital ", "Oxygen ", "Cardiac ", "Acute ",
    "Chronic ", "Chief ", "Present ", "Past ", "Family ", "Social ", "Review ", "Treatment ",
    "Provider ", "Contact ", "Nursing ", "Diagnostic ", "Consulting ", "Admitting ",
    "Allergic ", "Seasonal ", "General ", "Zip ", "Lives ", "Next ", "Local ", "Regional ",
    "National ",
];

static INVALID_ENDINGS: &[&str] = &[
    " the", " at", " in", " on", " to", " from", " reviewed", " case", " was", " is", " are",
    " patient", " doctor", " nurse", " staff", " phone", " address", " email", " number",
    " contact", " portal", " history", " status", " results", " plan", " notes", " unit",
    " rate", " pressure", " signs", " level", " name", " illness", " complaint",
    " appearance", " medications", " count", " panel", " mellitus", " information",
    " identifiers", " characteristics", "-up",
];

static MEDICAL_SUFFIXES: &[&str] = &[
    "Disorder", "Mellitus", "Disease", "Syndrome", "Infection", "Condition", "Health",
    "Hospital", "Clinic", "Center", "Partners", "Group", "Medical", "Medicine", "System",
    "Systems", "Pressure", "Rate", "Signs", "Phone", "Address", "Email", "Portal", "History",
    "Examination", "Studies", "Management", "Planning",
];

static LINE_BREAK_LABELS: &[&str] = &[
    "dx", "dob", "mrn", "age", "phone", "fax", "email", "address", "street", "zip", "zipcode",
    "npi", "dea", "ssn", "patient", "provider",
];

fn all_caps_letters_and_whitespace(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_whitespace())
}

fn label_like(tail: &str) -> bool {
    let lower = tail.to_ascii_lowercase();
    LINE_BREAK_LABELS.iter().any(|label| {
        lower.starts_with(label)
            && !lower[label.len()..]
                .chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '_')
                .unwrap_or(false)
    })
}

/// The full strategy chain for one span. Returns the name of the strategy
/// that drops it, or `None` to keep.
fn drop_reason(span: &Span, vocab: &Vocabulary) -> Option<&'static str> {
    let text = span.text.as_str();

    // DevicePhoneFalsePositive: ward furniture labels, not identifiers.
    if matches!(span.filter_type, FilterType::Device | FilterType::Phone) {
        let lower = text.to_ascii_lowercase();
        if lower.contains("call button") || lower.contains("room:") || lower.contains("bed:") {
            return Some("DevicePhoneFalsePositive");
        }
    }

    if span.filter_type != FilterType::Name {
        return None;
    }

    // SectionHeading: ALL CAPS headings the pattern filters misread as names.
    if all_caps_letters_and_whitespace(text) {
        let folded = text.trim().to_lowercase();
        if vocab.section_headings.contains(&folded) {
            return Some("SectionHeading");
        }
        let words: Vec<&str> = folded.split_whitespace().collect();
        if words.len() == 1 && vocab.section_headings.contains(words[0]) {
            return Some("SectionHeading");
        }
    }

    // StructureWord: any word of the span is document scaffolding.
    for word in text.split_whitespace() {
        let folded: String = word
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if !folded.is_empty() && vocab.structure_words.contains(&folded) {
            return Some("StructureWord");
        }
    }

    // ShortName: tiny low-confidence fragments.
    if text.chars().count() < 5 && !text.contains(',') && span.confidence < 0.9 {
        return Some("ShortName");
    }

    // InvalidPrefix (case-sensitive): sentence or field words glued on front.
    if INVALID_STARTS.iter().any(|s| text.starts_with(s)) {
        return Some("InvalidPrefix");
    }

    // InvalidSuffix (case-insensitive).
    {
        let lower = text.to_lowercase();
        if INVALID_ENDINGS.iter().any(|s| lower.ends_with(s)) {
            return Some("InvalidSuffix");
        }
    }

    // NameLineBreak: a "name" spilling onto the next line of a form.
    if text.contains('\n') || text.contains('\r') {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        if let Some((_, rest)) = normalized.split_once('\n') {
            let tail = rest.trim();
            if label_like(tail) {
                return Some("NameLineBreak");
            }
            let tail_len = tail.chars().count();
            if tail_len > 0 && tail_len <= 24 && tail.contains(':') {
                return Some("NameLineBreak");
            }
        }
    }

    // MedicalPhrase: the whole span is configured medical vocabulary.
    if vocab.medical_phrases.contains(text.to_lowercase().as_str()) {
        return Some("MedicalPhrase");
    }

    // MedicalSuffix (case-sensitive): condition or facility tails.
    if MEDICAL_SUFFIXES.iter().any(|s| text.ends_with(s)) {
        return Some("MedicalSuffix");
    }

    // GeographicTerm: any word in the geographic list.
    {
        let lower = text.to_lowercase();
        if lower
            .split_whitespace()
            .any(|w| vocab.geographic_terms.contains(w))
        {
            return Some("GeographicTerm");
        }
    }

    // FieldLabel: the span equals a configured form label.
    if vocab.field_labels.contains(text.to_lowercase().as_str()) {
        return Some("FieldLabel");
    }

    None
}

/// Run the chain over every surviving span. Deterministic; consumes and
/// re-emits the collection (value-owning pipeline stage).
pub fn prune(spans: Vec<Span>, vocab: &Vocabulary) -> (Vec<Span>, Vec<PrunedSpan>) {
    let mut kept = Vec::with_capacity(spans.len());
    let mut pruned = Vec::new();
    for span in spans {
        match drop_reason(&span, vocab) {
            Some(strategy) => {
                tracing::debug!(
                    strategy,
                    text = %span.text,
                    filter = span.filter_type.label(),
                    "pruned false-positive span"
                );
                pruned.push(PrunedSpan { span, strategy });
            }
            None => kept.push(span),
        }
    }
    (kept, pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_span(text: &str, confidence: f64) -> Span {
        Span::detected(FilterType::Name, 0, text.len(), text, confidence, "t")
    }

    fn prune_one(span: Span) -> Option<&'static str> {
        let vocab = Vocabulary::builtin();
        drop_reason(&span, &vocab)
    }

    #[test]
    fn real_names_survive() {
        assert_eq!(prune_one(name_span("John Smith", 0.92)), None);
        assert_eq!(prune_one(name_span("Alice Wong", 0.92)), None);
        assert_eq!(prune_one(name_span("Smith, Robert J", 0.9)), None);
    }

    #[test]
    fn device_phone_false_positive() {
        let span = Span::detected(FilterType::Phone, 0, 16, "Call Button: 555", 0.9, "t");
        assert_eq!(prune_one(span), Some("DevicePhoneFalsePositive"));
        let span = Span::detected(FilterType::Device, 0, 9, "Room: 412", 0.9, "t");
        assert_eq!(prune_one(span), Some("DevicePhoneFalsePositive"));
    }

    #[test]
    fn section_headings_dropped() {
        assert_eq!(prune_one(name_span("CHIEF COMPLAINT", 0.9)), Some("SectionHeading"));
        assert_eq!(prune_one(name_span("IMPRESSION", 0.9)), Some("SectionHeading"));
    }

    #[test]
    fn structure_words_dropped() {
        assert_eq!(prune_one(name_span("Insurance Policy Group", 0.9)), Some("StructureWord"));
    }

    #[test]
    fn short_low_confidence_names_dropped() {
        assert_eq!(prune_one(name_span("Ray", 0.7)), Some("ShortName"));
        assert_eq!(prune_one(name_span("Ray", 0.95)), None);
    }

    #[test]
    fn invalid_prefix_and_suffix() {
        assert_eq!(prune_one(name_span("The Johnson", 0.9)), Some("InvalidPrefix"));
        assert_eq!(prune_one(name_span("Johnson was", 0.9)), Some("InvalidSuffix"));
    }

    #[test]
    fn line_break_into_field_label() {
        assert_eq!(
            prune_one(name_span("Margaret Olson\nDOB: 01/02", 0.9)),
            Some("NameLineBreak")
        );
    }

    #[test]
    fn medical_phrase_and_suffix() {
        assert_eq!(prune_one(name_span("allergic rhinitis", 0.9)), Some("MedicalPhrase"));
        assert_eq!(prune_one(name_span("blood pressure", 0.9)), Some("StructureWord"));
        assert_eq!(prune_one(name_span("Wilsons Disease", 0.9)), Some("MedicalSuffix"));
        assert_eq!(prune_one(name_span("Boulder Community Hospital", 0.9)), Some("MedicalSuffix"));
    }

    #[test]
    fn geographic_term_words() {
        assert_eq!(prune_one(name_span("North Boulder", 0.9)), Some("GeographicTerm"));
    }

    #[test]
    fn field_labels_dropped() {
        assert_eq!(prune_one(name_span("Referring Physician", 0.9)), Some("FieldLabel"));
    }

    #[test]
    fn non_name_types_pass_untouched() {
        let span = Span::detected(FilterType::Ssn, 0, 11, "123-45-6789", 0.95, "t");
        assert_eq!(prune_one(span), None);
    }

    #[test]
    fn prune_partitions_spans() {
        let vocab = Vocabulary::builtin();
        let spans = vec![name_span("John Smith", 0.92), name_span("CHIEF COMPLAINT", 0.9)];
        let (kept, pruned) = prune(spans, &vocab);
        assert_eq!(kept.len(), 1);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].strategy, "SectionHeading");
    }
}
