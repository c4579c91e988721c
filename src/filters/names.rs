//! Name detection: anchored pattern families, dictionary lookups, and the
//! context-aware single-name scanner.
//!
//! Pattern captures are case-exact (`[A-Z][a-z]+`) with label words matched
//! through scoped `(?i:...)` groups, so "Patient was admitted" never reads
//! as a name. Dictionary matches anchor on the given-name/surname indexes,
//! with OCR-confusable letters folded before lookup.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::ContextStrength;
use crate::filters::{inside_placeholder, DetectInput};
use crate::span::{FilterType, Span};
use crate::vocab::FuzzyIndex;

// =============================================================================
// Anchored pattern family
// =============================================================================

static TITLED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:Dr|Mr|Mrs|Ms|Miss|Prof|Rev|Hon)\.?\s+([A-Z][A-Za-z'-]{1,30}(?:\s+[A-Z][A-Za-z'-]{1,30}){0,2})\b")
        .expect("titled name re")
});

static PATIENT_LABEL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:Patient|Pt|Subject|Client)\s*[:\t ]+([A-Z][a-z]+(?:\s+[A-Z]\.?)?(?:\s+[A-Z][a-z]+){1,2})\b")
        .expect("patient label name re")
});

static PATIENT_ALLCAPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:Patient|Pt|Name)\s*:\s*([A-Z]{2,}(?:\s+[A-Z]{2,}){1,2})\b")
        .expect("patient allcaps re")
});

static FAMILY_MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:mother|father|mom|dad|sister|brother|spouse|wife|husband|son|daughter)\s*[:\- ]\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})\b")
        .expect("family member re")
});

static NAME_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'-]{1,30}(?:\s+[A-Z][A-Za-z'-]{1,30}){1,2}),?\s+(?:Jr|Sr|II|III|IV)\.?\b")
        .expect("name suffix re")
});

static NAMED_PERSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:male|female|man|woman|boy|girl)\s+(?i:named)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})\b")
        .expect("named person re")
});

static HYPHENATED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:-[A-Z][a-z]+)+(?:\s+[A-Z][a-z]+)?)\b").expect("hyphenated re")
});

static PARTICLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]+\s+(?i:van|de|von|di|da|du|del|della|la|le|el|al|bin|ibn)\s+[A-Z][a-z]+)\b")
        .expect("particle name re")
});

static POSSESSIVE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]{2,})'s\b").expect("possessive re"));

static LIST_MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*[-*]\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})\b").expect("list member re")
});

static LAST_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'-]{1,20}),\s*([A-Z][A-Za-z'-]{1,30})(?:\s+[A-Z]\.?)?\b")
        .expect("last first re")
});

// Digits in the word tails allow OCR-corrupted names ("J0hn"); the folded
// dictionary lookup decides whether the pair is real.
static FIRST_LAST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z0-9'-]{1,30})\s+([A-Z][a-z0-9'-]{1,30})\b").expect("first last re")
});

static ALLCAPS_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2,}(?:\s+[A-Z]{2,}){1,2})\b").expect("allcaps pair re"));

static SINGLE_CAP_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]{2,})\b").expect("single cap word re"));

/// Disease eponyms that look like surnames. A hit next to disease wording is
/// medical vocabulary, not a person.
static DISEASE_EPONYMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "parkinson", "alzheimer", "hodgkin", "crohn", "addison", "cushing", "graves",
        "hashimoto", "bell", "raynaud", "meniere", "tourette", "wilson", "huntington",
        "marfan", "sjogren", "guillain", "kaposi", "kawasaki", "paget",
    ])
});

static DISEASE_FOLLOWERS: &[&str] = &[
    "disease", "syndrome", "disorder", "palsy", "sign", "test", "thyroiditis", "lymphoma",
    "tumor", "contracture",
];

static ALLCAPS_ACRONYMS: &[&str] = &[
    "CT", "MRI", "PET", "EKG", "ECG", "EEG", "CBC", "BMP", "ER", "ICU", "IV", "DOB", "MRN",
    "SSN", "NPI", "DEA", "HIPAA", "PHI",
];

fn eponym_followed_by_disease(text: &str, base: &str, end: usize) -> bool {
    if !DISEASE_EPONYMS.contains(base.to_lowercase().as_str()) {
        return false;
    }
    let tail_end = (end + 30).min(text.len());
    let mut tail_end = tail_end;
    while tail_end > end && !text.is_char_boundary(tail_end) {
        tail_end -= 1;
    }
    let tail = text[end..tail_end].to_lowercase();
    DISEASE_FOLLOWERS.iter().any(|w| tail.contains(w))
}

/// Letter-direction OCR folding used before dictionary lookups
/// ("J0hn" -> "john").
fn ocr_letters(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            '0' => 'o',
            '1' | '|' => 'l',
            '!' => 'i',
            '@' | '4' => 'a',
            '$' | '5' => 's',
            '3' => 'e',
            '8' => 'b',
            '6' | '9' => 'g',
            '7' => 't',
            _ => c,
        })
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn in_name_dict(idx: &FuzzyIndex, word: &str) -> bool {
    let folded = ocr_letters(word);
    idx.contains_exact(&folded) || idx.lookup(&folded).is_some()
}

fn any_word_in_dicts(input: &DetectInput, candidate: &str) -> bool {
    candidate.split(['-', ' ']).any(|w| {
        !w.is_empty()
            && (in_name_dict(&input.vocab.first_names, w) || in_name_dict(&input.vocab.surnames, w))
    })
}

fn push_name(
    out: &mut Vec<Span>,
    input: &DetectInput,
    start: usize,
    end: usize,
    confidence: f64,
    pattern: &str,
    dictionary_hit: bool,
) {
    if inside_placeholder(input.text, start, end) {
        return;
    }
    let text = &input.text[start..end];
    let mut span = Span::detected(FilterType::Name, start, end, text, confidence, pattern);
    span.dictionary_hit = dictionary_hit;
    out.push(span);
}

/// Deduplicate by byte range, keeping the highest-confidence detection.
fn dedupe_best(spans: Vec<Span>) -> Vec<Span> {
    let mut best: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match best
            .iter_mut()
            .find(|b| b.start == span.start && b.end == span.end)
        {
            Some(existing) => {
                if span.confidence > existing.confidence {
                    *existing = span;
                }
            }
            None => best.push(span),
        }
    }
    best.sort_by_key(|s| (s.start, s.end));
    best
}

pub fn detect_name_patterns(input: &DetectInput) -> Vec<Span> {
    let text = input.text;
    let mut out: Vec<Span> = Vec::new();

    let anchored: &[(&Lazy<Regex>, f64, &str, bool)] = &[
        (&TITLED_NAME_RE, 0.92, "titled-name", false),
        (&PATIENT_LABEL_NAME_RE, 0.92, "patient-label-name", false),
        (&PATIENT_ALLCAPS_RE, 0.90, "patient-allcaps-name", false),
        (&FAMILY_MEMBER_RE, 0.90, "family-member-name", false),
        (&NAME_SUFFIX_RE, 0.90, "generational-suffix-name", false),
        (&NAMED_PERSON_RE, 0.90, "named-person", false),
        (&HYPHENATED_NAME_RE, 0.86, "hyphenated-name", true),
        (&PARTICLE_NAME_RE, 0.86, "particle-name", false),
        (&LIST_MEMBER_RE, 0.85, "list-member-name", true),
    ];

    for (re, base_conf, id, need_anchor) in anchored {
        for caps in re.captures_iter(text) {
            let m = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            let candidate = m.as_str();
            if candidate.len() < 3 || candidate.contains(',') {
                continue;
            }
            if *need_anchor && !any_word_in_dicts(input, candidate) {
                continue;
            }
            let mut conf = *base_conf;
            if any_word_in_dicts(input, candidate) {
                conf = (conf + 0.05).min(0.95);
            }
            push_name(&mut out, input, m.start(), m.end(), conf, id, false);
        }
    }

    // Possessives are noisy: anchor on a dictionary and reject eponyms next
    // to disease wording ("Wilson's disease").
    for caps in POSSESSIVE_NAME_RE.captures_iter(text) {
        let m = match caps.get(1) {
            Some(m) => m,
            None => continue,
        };
        let base = m.as_str();
        if eponym_followed_by_disease(text, base, caps.get(0).map(|g| g.end()).unwrap_or(m.end())) {
            continue;
        }
        if !(in_name_dict(&input.vocab.first_names, base)
            || in_name_dict(&input.vocab.surnames, base))
        {
            continue;
        }
        push_name(&mut out, input, m.start(), m.end(), 0.78, "possessive-name", false);
    }

    dedupe_best(out)
}

// =============================================================================
// Dictionary family
// =============================================================================

pub fn detect_name_dictionary(input: &DetectInput) -> Vec<Span> {
    let text = input.text;
    let mut out: Vec<Span> = Vec::new();

    for caps in LAST_FIRST_RE.captures_iter(text) {
        let (m, last, first) = match (caps.get(0), caps.get(1), caps.get(2)) {
            (Some(m), Some(l), Some(f)) => (m, l.as_str(), f.as_str()),
            _ => continue,
        };
        let last_hit = in_name_dict(&input.vocab.surnames, last);
        let first_hit = in_name_dict(&input.vocab.first_names, first);
        if !(last_hit || first_hit) {
            continue;
        }
        let confidence = if last_hit && first_hit { 0.95 } else { 0.90 };
        push_name(&mut out, input, m.start(), m.end(), confidence, "last-comma-first", true);
    }

    for caps in FIRST_LAST_RE.captures_iter(text) {
        let (m, first, last) = match (caps.get(0), caps.get(1), caps.get(2)) {
            (Some(m), Some(f), Some(l)) => (m, f.as_str(), l.as_str()),
            _ => continue,
        };
        let first_is_first = in_name_dict(&input.vocab.first_names, first);
        let first_is_last = in_name_dict(&input.vocab.surnames, first);
        let last_is_last = in_name_dict(&input.vocab.surnames, last);
        let last_is_first = in_name_dict(&input.vocab.first_names, last);
        if !(first_is_first || first_is_last || last_is_last || last_is_first) {
            continue;
        }
        if eponym_followed_by_disease(text, last, m.end()) {
            continue;
        }
        let confidence = if first_is_first && last_is_last {
            0.92
        } else if first_is_first {
            0.84
        } else if last_is_last {
            if first_is_last {
                0.78
            } else {
                0.70
            }
        } else {
            0.68
        };
        push_name(&mut out, input, m.start(), m.end(), confidence, "first-last", true);
    }

    // Standalone ALL CAPS pairs need a dictionary anchor and must not be
    // known clinical acronyms.
    for caps in ALLCAPS_PAIR_RE.captures_iter(text) {
        let m = match caps.get(1) {
            Some(m) => m,
            None => continue,
        };
        let words: Vec<&str> = m.as_str().split_whitespace().collect();
        if words.len() < 2 || words.len() > 3 {
            continue;
        }
        if words.iter().any(|w| ALLCAPS_ACRONYMS.contains(w)) {
            continue;
        }
        if !any_word_in_dicts(input, m.as_str()) {
            continue;
        }
        push_name(&mut out, input, m.start(), m.end(), 0.86, "allcaps-name", true);
    }

    dedupe_best(out)
}

// =============================================================================
// Context-aware single names
// =============================================================================

/// Lone capitalized dictionary words are only names inside clinical context
/// (STRONG or MODERATE within the indicator window).
pub fn detect_context_name(input: &DetectInput) -> Vec<Span> {
    let text = input.text;
    let mut out: Vec<Span> = Vec::new();

    for caps in SINGLE_CAP_WORD_RE.captures_iter(text) {
        let m = match caps.get(1) {
            Some(m) => m,
            None => continue,
        };
        let word = m.as_str();
        if input.context.strength_at(m.start(), m.len()) < ContextStrength::Moderate {
            continue;
        }
        if eponym_followed_by_disease(text, word, m.end()) {
            continue;
        }
        let folded = ocr_letters(word);
        let hit = input
            .vocab
            .first_names
            .lookup(&folded)
            .or_else(|| input.vocab.surnames.lookup(&folded));
        let hit = match hit {
            Some(h) => h,
            None => continue,
        };
        let confidence = if hit.distance == 0 {
            0.75
        } else {
            (0.70 * hit.similarity).min(0.72)
        };
        push_name(&mut out, input, m.start(), m.end(), confidence, "context-single-name", true);
    }

    dedupe_best(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use crate::filters::FilterKind;

    #[test]
    fn titled_name_excludes_title() {
        let spans = run(FilterKind::NamePatterns, "consult Dr. Alice Wong.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Alice Wong");
    }

    #[test]
    fn patient_label_name() {
        let spans = run(FilterKind::NamePatterns, "Patient John Smith DOB 01/15/1990");
        assert!(spans.iter().any(|s| s.text == "John Smith"));
    }

    #[test]
    fn lowercase_after_label_is_not_a_name() {
        assert!(run(FilterKind::NamePatterns, "Patient was admitted overnight").is_empty());
    }

    #[test]
    fn eponym_possessive_not_flagged() {
        let spans = run(
            FilterKind::NamePatterns,
            "Diagnosis: Wilson's disease; consult Dr. Wilson.",
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Wilson");
        assert!(spans[0].start > 20);
    }

    #[test]
    fn dictionary_first_last_both_anchored() {
        let spans = run(FilterKind::NameDictionary, "seen by Maria Gonzalez today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Maria Gonzalez");
        assert!(spans[0].confidence > 0.9);
        assert!(spans[0].dictionary_hit);
    }

    #[test]
    fn last_comma_first() {
        let spans = run(FilterKind::NameDictionary, "Chart for Smith, Robert J.");
        assert!(spans.iter().any(|s| s.text.starts_with("Smith, Robert")));
    }

    #[test]
    fn unanchored_pair_ignored() {
        assert!(run(FilterKind::NameDictionary, "Tensor Decomposition Methods").is_empty());
    }

    #[test]
    fn allcaps_acronyms_excluded() {
        assert!(run(FilterKind::NameDictionary, "ordered CT MRI today").is_empty());
    }

    #[test]
    fn fuzzy_ocr_name_matches() {
        // Zero is folded to the letter o before lookup.
        let spans = run(FilterKind::NameDictionary, "note for J0hn Smith");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn context_single_name_requires_context() {
        assert!(run(FilterKind::ContextAwareName, "Wilson went home").is_empty());
        let spans = run(
            FilterKind::ContextAwareName,
            "Patient: Wilson was admitted and complains of chest pain",
        );
        assert!(spans.iter().any(|s| s.text == "Wilson"));
    }
}
