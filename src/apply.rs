//! Redaction application: the final linear pass that produces the output
//! text from the surviving span set.
//!
//! Text between spans is copied verbatim; each span is replaced by the
//! policy-configured placeholder (or a consistency token when a provider is
//! plugged in). The pass makes no intermediate copies of the redacted
//! values: the output buffer only ever receives non-PHI segments.

use crate::error::{RedactError, Result};
use crate::policy::Policy;
use crate::span::Span;
use crate::token::{normalize_value, TokenProvider};

/// Result of one application pass.
#[derive(Debug)]
pub struct Applied {
    pub text: String,
    /// Spans with `applied` and `replacement` filled in, still sorted by
    /// start with offsets into the *input* document.
    pub spans: Vec<Span>,
}

/// Apply `spans` (sorted, pairwise non-overlapping) to `doc`.
///
/// Offset or ordering violations are internal errors: the document fails
/// rather than emitting a partially redacted result.
pub fn apply(
    doc: &str,
    mut spans: Vec<Span>,
    policy: &Policy,
    tokens: Option<&dyn TokenProvider>,
) -> Result<Applied> {
    let mut out = String::with_capacity(doc.len());
    let mut cursor = 0usize;

    for span in &mut spans {
        let in_bounds = span.start < span.end
            && span.end <= doc.len()
            && span.start >= cursor
            && doc.is_char_boundary(span.start)
            && doc.is_char_boundary(span.end);
        if !in_bounds || doc[span.start..span.end] != *span.text {
            return Err(RedactError::ApplierOffset {
                start: span.start,
                end: span.end,
                doc_len: doc.len(),
                span: Box::new(span.clone()),
            });
        }

        out.push_str(&doc[cursor..span.start]);

        let replacement = tokens
            .and_then(|p| p.token(span.filter_type, &normalize_value(&span.text)))
            .unwrap_or_else(|| policy.replacement_for(span.filter_type));
        out.push_str(&replacement);

        span.replacement = Some(replacement);
        span.applied = true;
        cursor = span.end;
    }

    out.push_str(&doc[cursor..]);
    Ok(Applied { text: out, spans })
}
