//! safeharbor: HIPAA Safe Harbor PHI redaction core for clinical free-text.
//!
//! Offline, in-process pipeline: a parallel multi-filter detection pass over
//! one document, deterministic overlap resolution, rule-based false-positive
//! pruning, context-aware confidence calibration, and a linear application
//! pass that emits the redacted text plus a structured audit report.
//!
//! ```no_run
//! let outcome = safeharbor::redact(
//!     "Patient John Smith DOB 01/15/1990 SSN 123-45-6789",
//!     &safeharbor::Policy::default(),
//! ).unwrap();
//! assert_eq!(outcome.text, "Patient [NAME] DOB [DATE] SSN [SSN]");
//! ```

#![deny(clippy::all)]

pub mod apply;
pub mod calibrate;
pub mod context;
pub mod engine;
pub mod error;
pub mod filters;
pub mod policy;
pub mod pruner;
pub mod quality;
pub mod report;
pub mod resolver;
pub mod span;
pub mod token;
pub mod vocab;

use once_cell::sync::Lazy;

pub use calibrate::Thresholds;
pub use context::{ContextStrength, DocumentProfile};
pub use engine::{CancelFlag, EngineConfig, RedactionEngine, RedactionOutcome};
pub use error::{RedactError, Result};
pub use policy::{IdentifierRule, Policy, ReplacementStyle};
pub use quality::{QualityAnalysis, QualityBand};
pub use report::{explain, Decision, ExplanationReport, Report};
pub use span::{FilterType, Span};
pub use token::{HmacTokenProvider, TokenProvider};
pub use vocab::Vocabulary;

/// Process-wide default engine over the compiled-in vocabulary; built once
/// on first use. Callers that load vocabulary files or custom thresholds
/// construct their own [`RedactionEngine`].
static DEFAULT_ENGINE: Lazy<RedactionEngine> = Lazy::new(RedactionEngine::default);

/// Initialize `tracing` from `RUST_LOG`. Safe to call more than once.
pub fn init_telemetry() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    tracing::info!("safeharbor core initialized");
}

/// Redact one document under `policy`, blocking until complete.
pub fn redact(text: &str, policy: &Policy) -> Result<RedactionOutcome> {
    DEFAULT_ENGINE.redact(text, policy)
}

/// Byte-level entry point; rejects non-UTF-8 input as [`RedactError::InvalidInput`].
pub fn redact_bytes(bytes: &[u8], policy: &Policy) -> Result<RedactionOutcome> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| RedactError::InvalidInput(format!("text is not valid UTF-8: {e}")))?;
    redact(text, policy)
}

/// Redact many documents; parallel internally, each document independent.
pub fn redact_batch(texts: &[&str], policy: &Policy) -> Vec<Result<RedactionOutcome>> {
    DEFAULT_ENGINE.redact_batch(texts, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_redact_works() {
        let out = redact("SSN 123-45-6789", &Policy::default()).unwrap();
        assert_eq!(out.text, "SSN [SSN]");
        assert_eq!(out.redaction_count, 1);
    }

    #[test]
    fn non_utf8_bytes_rejected() {
        let err = redact_bytes(&[0x66, 0xff, 0xfe], &Policy::default()).unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput(_)));
    }

    #[test]
    fn batch_entry_point() {
        let results = redact_batch(&["SSN 123-45-6789", "nothing here"], &Policy::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().redaction_count, 1);
        assert_eq!(results[1].as_ref().unwrap().redaction_count, 0);
    }
}
