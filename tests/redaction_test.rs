//! End-to-end pipeline tests: the concrete clinical scenarios and the
//! universal invariants every redaction run must uphold.

use safeharbor::{redact, redact_batch, FilterType, Policy, RedactionOutcome, ReplacementStyle};

fn run(text: &str) -> RedactionOutcome {
    redact(text, &Policy::default()).expect("redaction should succeed")
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_patient_line_with_dob_and_ssn() {
    let out = run("Patient John Smith DOB 01/15/1990 SSN 123-45-6789");
    assert_eq!(out.text, "Patient [NAME] DOB [DATE] SSN [SSN]");
    assert_eq!(out.report.by_type.get("NAME"), Some(&1));
    assert_eq!(out.report.by_type.get("DATE"), Some(&1));
    assert_eq!(out.report.by_type.get("SSN"), Some(&1));
}

#[test]
fn scenario_phone_and_titled_name() {
    let out = run("Call (555) 123-4567 for Dr. Alice Wong.");
    assert_eq!(out.text, "Call [PHONE] for Dr. [NAME].");
}

#[test]
fn scenario_disease_eponym_vs_person() {
    let out = run("Diagnosis: Wilson's disease; consult Dr. Wilson.");
    assert_eq!(out.text, "Diagnosis: Wilson's disease; consult Dr. [NAME].");
}

#[test]
fn scenario_ward_labels_unchanged() {
    let doc = "Room: 412   Call Button: 555";
    let out = run(doc);
    assert_eq!(out.text, doc);
    assert_eq!(out.redaction_count, 0);
}

#[test]
fn scenario_age_ninety_plus() {
    let out = run("The patient is 94 years old.");
    assert_eq!(out.text, "The patient is [AGE] years old.");

    let doc = "The patient is 62 years old.";
    let out = run(doc);
    assert_eq!(out.text, doc);
}

#[test]
fn scenario_ocr_corrupted_ssn_both_modes() {
    let doc = "SSN l23-45-67B9";

    let tolerant = Policy::default();
    assert!(tolerant.ocr_tolerant);
    let out = redact(doc, &tolerant).unwrap();
    assert_eq!(out.text, "SSN [SSN]");

    let mut strict = Policy::default();
    strict.ocr_tolerant = false;
    let out = redact(doc, &strict).unwrap();
    assert_eq!(out.text, doc, "strict mode must leave the corrupted value");
}

// ---------------------------------------------------------------------------
// Universal invariants
// ---------------------------------------------------------------------------

const CLINICAL_NOTE: &str = "\
Patient: Margaret Olson was admitted on 01/15/2024.\n\
MRN: 4482917 Phone: (303) 555-0148\n\
Email margaret.olson@example.org; lives at 412 Maple Street.\n\
The patient is 94 years old and complains of chest pain.\n";

#[test]
fn offset_safety_every_applied_span_matches_document() {
    let out = run(CLINICAL_NOTE);
    assert!(out.redaction_count > 0);
    for span in &out.spans {
        assert_eq!(
            &CLINICAL_NOTE[span.start..span.end],
            span.text,
            "span text must equal the document slice it claims"
        );
    }
}

#[test]
fn non_overlap_and_sorted_by_start() {
    let out = run(CLINICAL_NOTE);
    for pair in out.spans.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}

#[test]
fn no_leak_of_detected_values() {
    let out = run(CLINICAL_NOTE);
    for span in &out.spans {
        assert!(
            !out.text.contains(&span.text),
            "redacted value {:?} leaked into output",
            span.text
        );
    }
}

#[test]
fn idempotence_on_already_redacted_output() {
    for doc in [
        "Patient John Smith DOB 01/15/1990 SSN 123-45-6789",
        CLINICAL_NOTE,
        "Call (555) 123-4567 for Dr. Alice Wong.",
    ] {
        let once = run(doc);
        let twice = run(&once.text);
        assert_eq!(twice.text, once.text, "placeholders must not re-redact");
    }
}

#[test]
fn determinism_across_repeated_runs() {
    let first = run(CLINICAL_NOTE);
    for _ in 0..5 {
        let next = run(CLINICAL_NOTE);
        assert_eq!(next.text, first.text);
        let key = |o: &RedactionOutcome| -> Vec<(usize, usize, String)> {
            o.spans
                .iter()
                .map(|s| (s.start, s.end, s.filter_type.label().to_string()))
                .collect()
        };
        assert_eq!(key(&next), key(&first));
    }
}

#[test]
fn policy_monotonicity_disabling_a_type() {
    let full = run("Patient John Smith DOB 01/15/1990 SSN 123-45-6789");

    let mut narrowed = Policy::default();
    narrowed.disable(FilterType::Date);
    let partial = redact("Patient John Smith DOB 01/15/1990 SSN 123-45-6789", &narrowed).unwrap();

    assert!(partial.redaction_count <= full.redaction_count);
    assert_eq!(partial.text, "Patient [NAME] DOB 01/15/1990 SSN [SSN]");

    // Spans of the remaining types are unchanged.
    let keep = |o: &RedactionOutcome, ft: FilterType| -> Vec<(usize, usize)> {
        o.spans
            .iter()
            .filter(|s| s.filter_type == ft)
            .map(|s| (s.start, s.end))
            .collect()
    };
    assert_eq!(keep(&partial, FilterType::Ssn), keep(&full, FilterType::Ssn));
    assert_eq!(keep(&partial, FilterType::Name), keep(&full, FilterType::Name));
}

#[test]
fn whitespace_preserved_outside_spans() {
    let doc = "  SSN\t123-45-6789 \n\n trailing   spaces  ";
    let out = run(doc);
    assert_eq!(out.text, "  SSN\t[SSN] \n\n trailing   spaces  ");
}

// ---------------------------------------------------------------------------
// Boundary cases
// ---------------------------------------------------------------------------

#[test]
fn empty_document() {
    let out = run("");
    assert_eq!(out.text, "");
    assert_eq!(out.redaction_count, 0);
    assert!(out.report.explanations.is_empty());
}

#[test]
fn whole_document_is_one_span() {
    let out = run("123-45-6789");
    assert_eq!(out.text, "[SSN]");
    assert_eq!(out.spans.len(), 1);
    assert_eq!((out.spans[0].start, out.spans[0].end), (0, 11));
}

#[test]
fn span_at_byte_zero_and_final_byte() {
    let out = run("123-45-6789 then 321-54-9876");
    assert_eq!(out.text, "[SSN] then [SSN]");
    assert_eq!(out.spans.first().unwrap().start, 0);
    assert_eq!(out.spans.last().unwrap().end, "123-45-6789 then 321-54-9876".len());
}

#[test]
fn multibyte_prefix_keeps_offsets_valid() {
    let doc = "📋 résumé note: SSN 123-45-6789";
    let out = run(doc);
    assert!(out.text.contains("[SSN]"));
    assert!(out.text.starts_with("📋 résumé note"));
    for span in &out.spans {
        assert_eq!(&doc[span.start..span.end], span.text);
    }
}

#[test]
fn identical_offsets_different_types_yield_single_redaction() {
    // The fax label makes the same digits both FAX and PHONE candidates;
    // exactly one placeholder must come out.
    let out = run("Fax: (303) 555-0188");
    assert_eq!(out.redaction_count, 1);
    assert_eq!(out.text, "Fax: [FAX]");
    assert!(out.spans[0].ambiguous_with.contains(&FilterType::Phone));
}

// ---------------------------------------------------------------------------
// Batch + report
// ---------------------------------------------------------------------------

#[test]
fn batch_matches_single_document_results() {
    let docs = [
        "Patient John Smith DOB 01/15/1990 SSN 123-45-6789",
        "Call (555) 123-4567 for Dr. Alice Wong.",
        "",
    ];
    let batch = redact_batch(&docs, &Policy::default());
    assert_eq!(batch.len(), 3);
    for (doc, result) in docs.iter().zip(batch) {
        let single = run(doc);
        assert_eq!(result.unwrap().text, single.text);
    }
}

#[test]
fn context_filter_family_can_be_disabled() {
    let doc = "Patient: admitted and complains of pain, lives in Boston currently";
    let with_context = redact(doc, &Policy::default()).unwrap();
    assert!(with_context.text.contains("[ADDRESS]"));

    let mut policy = Policy::default();
    policy.context_filters_enabled = false;
    let without = redact(doc, &policy).unwrap();
    assert!(without.text.contains("Boston"));
}

#[test]
fn asterisk_replacement_style() {
    let mut policy = Policy::default();
    policy.replacement_style = ReplacementStyle::Asterisks;
    let out = redact("SSN 123-45-6789", &policy).unwrap();
    assert_eq!(out.text, "SSN ****");
}

#[test]
fn explain_derives_decisions_from_outcome() {
    let out = run("Patient John Smith SSN 123-45-6789");
    assert!(!out.spans.is_empty());
    let report = safeharbor::explain(&out.spans, 0.5);
    assert_eq!(report.redacted, out.spans.len());
    assert_eq!(report.suppressed, 0);
}

#[test]
fn degraded_documents_are_flagged_in_the_report() {
    let clean = run("The patient was admitted overnight and is resting comfortably now.");
    assert_eq!(clean.report.document_quality, "CLEAN");
    let noisy = run("Pat1ent J0hn 5mith adm1tted w1th che5t pa1n t0day 0vern1ght");
    assert_ne!(noisy.report.document_quality, "CLEAN");
}

#[test]
fn report_carries_provenance_and_timing() {
    let out = run(CLINICAL_NOTE);
    assert!(out.report.timestamp_ms > 0);
    assert_eq!(out.report.redacted_count, out.redaction_count);
    let redacted: Vec<_> = out
        .report
        .explanations
        .iter()
        .filter(|e| e.decision == safeharbor::Decision::Redacted)
        .collect();
    assert_eq!(redacted.len(), out.redaction_count);
    for explanation in &redacted {
        assert!(!explanation.phi_type.is_empty());
        assert!(explanation.final_confidence > 0.0);
    }
    // Serializes for downstream audit tooling.
    let json = out.report.to_json().unwrap();
    assert!(json.contains("execution_time_ms"));
}
