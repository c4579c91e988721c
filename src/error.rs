//! Structured failures surfaced by the redaction engine.
//!
//! Filter-internal panics are contained at the coordinator boundary and only
//! appear as report entries; every other error propagates to the caller as a
//! typed failure, never as corrupt output.

use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Error)]
pub enum RedactError {
    /// The input text or policy references something the engine cannot act on.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Policy file could not be located at load time.
    #[error("policy not found: {0}")]
    PolicyNotFound(String),

    /// Policy parsed but is semantically broken (unknown filter type, bad
    /// replacement style, conflicting enable lists).
    #[error("malformed policy: {0}")]
    PolicyMalformed(String),

    /// A vocabulary file is missing or unreadable. Fatal at startup; on a
    /// runtime reload the previous dictionary is kept and this is logged.
    #[error("dictionary load failed for {path}: {reason}")]
    DictionaryLoad { path: String, reason: String },

    /// A single filter failed internally. Recovered locally; recorded so the
    /// report can show the dropped contribution.
    #[error("filter {filter} failed internally: {reason}")]
    FilterInternal { filter: String, reason: String },

    /// Per-document deadline exceeded. No partial redaction is emitted.
    #[error("document processing exceeded deadline of {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },

    /// Batch was cancelled before this document started; documents already
    /// in flight run to completion.
    #[error("batch cancelled before document was processed")]
    Cancelled,

    /// Invariant violation: a surviving span has offsets outside the
    /// document. Fatal for the document; carries the offending span.
    #[error("applier offset invariant violated at {start}..{end} (doc len {doc_len})")]
    ApplierOffset {
        start: usize,
        end: usize,
        doc_len: usize,
        span: Box<Span>,
    },
}

pub type Result<T> = std::result::Result<T, RedactError>;
