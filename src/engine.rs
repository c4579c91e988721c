//! Detection coordinator: fan-out over filters inside one document, fan-out
//! over documents in a batch, and the stage pipeline
//! detect -> resolve -> prune -> calibrate -> apply.
//!
//! No shared mutable state during detection: each filter writes its own
//! vector and the vectors merge afterwards, so output is bit-identical for a
//! given (document, policy, vocabulary) regardless of scheduling.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::apply;
use crate::calibrate::{calibrate, Thresholds};
use crate::context::ContextMap;
use crate::error::{RedactError, Result};
use crate::filters::{ocr_normalize, registry, DetectInput};
use crate::policy::Policy;
use crate::report::{epoch_millis, Decision, Explanation, PhaseTimings, Report};
use crate::resolver::resolve;
use crate::span::Span;
use crate::token::TokenProvider;
use crate::vocab::Vocabulary;
use crate::pruner::prune;
use crate::quality;

/// Result of redacting one document.
#[derive(Debug)]
pub struct RedactionOutcome {
    pub text: String,
    pub redaction_count: usize,
    /// Applied spans, sorted by start, offsets into the input document.
    pub spans: Vec<Span>,
    pub report: Report,
    pub elapsed_ms: u64,
}

/// Cooperative batch cancellation: flips between documents, never inside one.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Operational knobs, environment-driven. Unknown or malformed values are
/// ignored and the defaults keep working.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-document wall-clock limit; exceeding it fails the document.
    pub deadline: Option<Duration>,
    /// Worker-count override for the detection pool.
    pub workers: Option<usize>,
    /// Verbose span-journey tracing at debug level.
    pub trace_spans: bool,
    /// Master switch for the OCR-tolerant second pass; ANDed with the
    /// per-request policy flag.
    pub ocr_tolerant: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            deadline: None,
            workers: None,
            trace_spans: false,
            ocr_tolerant: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl EngineConfig {
    /// `SAFEHARBOR_WORKERS`, `SAFEHARBOR_TRACE_SPANS`,
    /// `SAFEHARBOR_OCR_TOLERANT`.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();
        if let Ok(raw) = std::env::var("SAFEHARBOR_WORKERS") {
            config.workers = raw.trim().parse::<usize>().ok().filter(|n| *n > 0);
        }
        if let Some(flag) = env_flag("SAFEHARBOR_TRACE_SPANS") {
            config.trace_spans = flag;
        }
        if let Some(flag) = env_flag("SAFEHARBOR_OCR_TOLERANT") {
            config.ocr_tolerant = flag;
        }
        config
    }
}

/// The engine owns the process-lifetime tables (vocabulary, thresholds) and
/// an optional dedicated worker pool. Everything else is per-request.
pub struct RedactionEngine {
    vocab: Arc<Vocabulary>,
    thresholds: Thresholds,
    config: EngineConfig,
    pool: Option<rayon::ThreadPool>,
    tokens: Option<Box<dyn TokenProvider>>,
}

impl RedactionEngine {
    pub fn new(vocab: Vocabulary) -> Self {
        Self::with_config(vocab, EngineConfig::from_env())
    }

    pub fn with_config(vocab: Vocabulary, config: EngineConfig) -> Self {
        let pool = config.workers.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| {
                    tracing::warn!(error = %e, "worker pool override failed, using global pool");
                    e
                })
                .ok()
        });
        RedactionEngine {
            vocab: Arc::new(vocab),
            thresholds: Thresholds::default(),
            config,
            pool,
            tokens: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Plug in a consistency-token provider consulted by the applier.
    pub fn with_token_provider(mut self, provider: Box<dyn TokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Redact one document under `policy`.
    pub fn redact(&self, text: &str, policy: &Policy) -> Result<RedactionOutcome> {
        policy.validate()?;
        let started = Instant::now();

        if text.is_empty() {
            let mut report = Report::default();
            report.timestamp_ms = epoch_millis();
            report.document_profile = "UNKNOWN".to_string();
            return Ok(RedactionOutcome {
                text: String::new(),
                redaction_count: 0,
                spans: Vec::new(),
                report,
                elapsed_ms: 0,
            });
        }

        let deadline = self.config.deadline.map(|d| started + d);
        let check_deadline = |phase: &str| -> Result<()> {
            if let (Some(limit), Some(configured)) = (deadline, self.config.deadline) {
                if Instant::now() > limit {
                    tracing::warn!(phase, "document exceeded deadline");
                    return Err(RedactError::Timeout {
                        deadline_ms: configured.as_millis() as u64,
                    });
                }
            }
            Ok(())
        };

        let mut timing = PhaseTimings::default();

        // Context pass: one scan, shared read-only with every filter. The
        // quality analyzer rides along to size the calibration relief.
        let phase = Instant::now();
        let context = ContextMap::build(text);
        let doc_quality = quality::analyze(text);
        timing.context_ms = phase.elapsed().as_millis() as u64;

        // Detection fan-out.
        let phase = Instant::now();
        let ocr_shadow = if policy.ocr_tolerant && self.config.ocr_tolerant {
            Some(ocr_normalize(text))
        } else {
            None
        };
        let (mut candidates, filter_errors) =
            self.run_filters(text, ocr_shadow.as_deref(), &context, policy);
        timing.detect_ms = phase.elapsed().as_millis() as u64;
        check_deadline("detect")?;

        for span in &mut candidates {
            span.capture_window(text, 3);
        }

        let mut report = Report::default();
        report.filter_errors = filter_errors;
        report.document_profile = context.profile().label().to_string();
        report.document_quality = doc_quality.band.label().to_string();
        report.total_detections = candidates.len();
        for span in &candidates {
            *report
                .detected_by_type
                .entry(span.filter_type.label().to_string())
                .or_default() += 1;
        }

        // Disabled types still detect for the report but never compete for
        // output.
        let mut ignored: Vec<Span> = Vec::new();
        let mut active: Vec<Span> = Vec::new();
        for mut span in candidates {
            if policy.is_enabled(span.filter_type) {
                active.push(span);
            } else {
                span.ignored = true;
                ignored.push(span);
            }
        }

        // Resolution.
        let phase = Instant::now();
        let resolution = resolve(active);
        timing.resolve_ms = phase.elapsed().as_millis() as u64;
        report.warnings = resolution.warnings;
        check_deadline("resolve")?;

        // Pruning.
        let phase = Instant::now();
        let (survivors, pruned) = prune(resolution.kept, &self.vocab);
        timing.prune_ms = phase.elapsed().as_millis() as u64;
        check_deadline("prune")?;

        // Calibration.
        let phase = Instant::now();
        let calibration = calibrate(
            survivors,
            &context,
            &self.thresholds,
            doc_quality.threshold_relief,
        );
        timing.calibrate_ms = phase.elapsed().as_millis() as u64;
        check_deadline("calibrate")?;

        // Application.
        let phase = Instant::now();
        let to_apply: Vec<Span> = calibration.kept.iter().map(|c| c.span.clone()).collect();
        let applied = apply::apply(text, to_apply, policy, self.tokens.as_deref())?;
        timing.apply_ms = phase.elapsed().as_millis() as u64;

        if self.config.trace_spans {
            for span in &applied.spans {
                tracing::debug!(
                    filter = span.filter_type.label(),
                    start = span.start,
                    end = span.end,
                    confidence = span.confidence,
                    replacement = span.replacement.as_deref().unwrap_or(""),
                    "span applied"
                );
            }
        }

        // Report assembly: applied spans first, then everything that was
        // held back and why.
        let indicators = |span: &Span| -> Vec<String> {
            context
                .indicators_at(span.start, span.len())
                .into_iter()
                .map(|s| s.to_string())
                .collect()
        };
        for (span, calibrated) in applied.spans.iter().zip(calibration.kept.iter()) {
            report.explanations.push(Explanation::for_span(
                span,
                calibrated.factors.clone(),
                indicators(span),
                Decision::Redacted,
                None,
            ));
            *report
                .by_type
                .entry(span.filter_type.label().to_string())
                .or_default() += 1;
        }
        for item in &pruned {
            report.explanations.push(Explanation::for_span(
                &item.span,
                Vec::new(),
                indicators(&item.span),
                Decision::Pruned,
                Some(item.strategy.to_string()),
            ));
        }
        for item in &calibration.dropped {
            report.explanations.push(Explanation::for_span(
                &item.span,
                item.factors.clone(),
                indicators(&item.span),
                Decision::BelowThreshold,
                Some(format!("minimum {:.2}", item.threshold)),
            ));
        }
        for span in &ignored {
            report.explanations.push(Explanation::for_span(
                span,
                Vec::new(),
                Vec::new(),
                Decision::Ignored,
                Some("type disabled by policy".to_string()),
            ));
        }

        report.redacted_count = applied.spans.len();
        report.allowed_count = report.total_detections - report.redacted_count;
        report.timing = timing;
        report.timestamp_ms = epoch_millis();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        report.execution_time_ms = elapsed_ms;

        Ok(RedactionOutcome {
            redaction_count: applied.spans.len(),
            spans: applied.spans,
            text: applied.text,
            report,
            elapsed_ms,
        })
    }

    /// Batch entry: documents are independent; the pool runs them
    /// concurrently with per-document fan-out inside.
    pub fn redact_batch(&self, texts: &[&str], policy: &Policy) -> Vec<Result<RedactionOutcome>> {
        self.redact_batch_with_cancel(texts, policy, &CancelFlag::new())
    }

    /// Batch with cooperative cancellation between documents. Documents not
    /// yet started when the flag flips return [`RedactError::Cancelled`].
    pub fn redact_batch_with_cancel(
        &self,
        texts: &[&str],
        policy: &Policy,
        cancel: &CancelFlag,
    ) -> Vec<Result<RedactionOutcome>> {
        let work = || {
            texts
                .par_iter()
                .map(|text| {
                    if cancel.is_cancelled() {
                        return Err(RedactError::Cancelled);
                    }
                    self.redact(text, policy)
                })
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    /// Parallel filter fan-out with panic isolation. Each worker gets the
    /// immutable document and vocabulary handle and appends to its own
    /// vector; merge order follows the registry, so scheduling never shows
    /// up in the output.
    fn run_filters(
        &self,
        text: &str,
        ocr_text: Option<&str>,
        context: &ContextMap,
        policy: &Policy,
    ) -> (Vec<Span>, Vec<String>) {
        let run = || {
            registry()
                .par_iter()
                .map(|descriptor| {
                    if descriptor.context_family && !policy.context_filters_enabled {
                        return (descriptor, Ok(Vec::new()));
                    }
                    let input = DetectInput {
                        text,
                        ocr_text,
                        vocab: &self.vocab,
                        context,
                    };
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        let mut spans = descriptor.kind.detect(&input);
                        for span in &mut spans {
                            span.priority = descriptor.priority;
                        }
                        spans
                    }))
                    .map_err(|panic| {
                        let reason = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        reason
                    });
                    (descriptor, result)
                })
                .collect::<Vec<_>>()
        };

        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut merged = Vec::new();
        let mut errors = Vec::new();
        for (descriptor, result) in results {
            match result {
                Ok(spans) => merged.extend(spans),
                Err(reason) => {
                    tracing::error!(
                        filter = descriptor.name,
                        reason = %reason,
                        "filter failed, contribution dropped"
                    );
                    errors.push(format!("{}: {}", descriptor.name, reason));
                }
            }
        }
        (merged, errors)
    }
}

impl Default for RedactionEngine {
    fn default() -> Self {
        RedactionEngine::new(Vocabulary::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FilterType;

    fn engine() -> RedactionEngine {
        RedactionEngine::with_config(Vocabulary::builtin(), EngineConfig::default())
    }

    #[test]
    fn empty_document_short_circuits() {
        let out = engine().redact("", &Policy::default()).unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.redaction_count, 0);
        assert!(out.spans.is_empty());
    }

    #[test]
    fn disabled_type_is_reported_but_not_applied() {
        let mut policy = Policy::default();
        policy.disable(FilterType::Ssn);
        let out = engine()
            .redact("SSN 123-45-6789 on file", &policy)
            .unwrap();
        assert!(out.text.contains("123-45-6789"), "disabled type must not redact");
        assert!(out
            .report
            .explanations
            .iter()
            .any(|e| e.phi_type == "SSN" && e.decision == Decision::Ignored));
        assert_eq!(out.report.by_type.get("SSN"), None);
    }

    #[test]
    fn report_counts_line_up() {
        let out = engine()
            .redact("Patient John Smith SSN 123-45-6789", &Policy::default())
            .unwrap();
        assert_eq!(out.redaction_count, out.spans.len());
        assert_eq!(out.report.redacted_count, out.redaction_count);
        assert_eq!(
            out.report.total_detections,
            out.report.redacted_count + out.report.allowed_count
        );
        let applied_sum: usize = out.report.by_type.values().sum();
        assert_eq!(applied_sum, out.report.redacted_count);
    }

    #[test]
    fn deadline_times_out() {
        let config = EngineConfig {
            deadline: Some(Duration::from_nanos(1)),
            ..EngineConfig::default()
        };
        let engine = RedactionEngine::with_config(Vocabulary::builtin(), config);
        let long_doc = "Patient John Smith SSN 123-45-6789. ".repeat(200);
        let err = engine.redact(&long_doc, &Policy::default()).unwrap_err();
        assert!(matches!(err, RedactError::Timeout { .. }));
    }

    #[test]
    fn batch_processes_independently() {
        let results = engine().redact_batch(
            &["SSN 123-45-6789", "", "Call (555) 123-4567"],
            &Policy::default(),
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().text.contains("[SSN]"));
        assert_eq!(results[1].as_ref().unwrap().text, "");
        assert!(results[2].as_ref().unwrap().text.contains("[PHONE]"));
    }

    #[test]
    fn cancelled_batch_marks_unstarted_documents() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let results = engine().redact_batch_with_cancel(
            &["SSN 123-45-6789"],
            &Policy::default(),
            &cancel,
        );
        assert!(matches!(results[0], Err(RedactError::Cancelled)));
    }

    #[test]
    fn worker_override_still_deterministic() {
        let config = EngineConfig {
            workers: Some(2),
            ..EngineConfig::default()
        };
        let narrow = RedactionEngine::with_config(Vocabulary::builtin(), config);
        let wide = engine();
        let doc = "Patient John Smith DOB 01/15/1990 SSN 123-45-6789 Call (555) 123-4567";
        let a = narrow.redact(doc, &Policy::default()).unwrap();
        let b = wide.redact(doc, &Policy::default()).unwrap();
        assert_eq!(a.text, b.text);
    }
}
