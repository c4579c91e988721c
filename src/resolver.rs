//! Overlap/priority resolution.
//!
//! Given an unsorted multiset of candidate spans over one document, select a
//! sorted, pairwise-non-overlapping subset by a deterministic score-tuple
//! ordering. Two structurally different implementations are kept in lockstep:
//! the interval-tree walk used in production and a naive quadratic scan the
//! tests cross-validate against.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::span::{FilterType, Span};

/// Output of one resolution pass.
pub struct Resolution {
    /// Non-overlapping winners, sorted by start.
    pub kept: Vec<Span>,
    /// Human-readable notes about dropped malformed candidates.
    pub warnings: Vec<String>,
}

/// Lexicographic score-tuple ordering; `Less` means `a` outranks `b`.
///
/// Priority and specificity dominate, so a short structured span (SSN) beats
/// the generic container (NAME) that covers it; at equal priority and
/// specificity the higher confidence and then the longer span wins; start
/// offset and the type label break the final ties for full determinism.
fn rank(a: &Span, b: &Span) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(b.filter_type.specificity().cmp(&a.filter_type.specificity()))
        .then(b.confidence.total_cmp(&a.confidence))
        .then(b.len().cmp(&a.len()))
        .then(a.start.cmp(&b.start))
        .then(a.filter_type.label().cmp(b.filter_type.label()))
}

/// Shared preamble: drop malformed candidates, collapse exact duplicates to
/// the highest-confidence copy, and order by score tuple.
fn prepare(candidates: Vec<Span>) -> (Vec<Span>, Vec<String>, BTreeMap<(usize, usize), BTreeSet<FilterType>>) {
    let mut warnings = Vec::new();
    let mut by_key: HashMap<(usize, usize, FilterType), Span> = HashMap::new();
    let mut types_at: BTreeMap<(usize, usize), BTreeSet<FilterType>> = BTreeMap::new();

    for span in candidates {
        if span.is_empty() {
            warnings.push(format!(
                "dropped malformed {} candidate at {}..{}",
                span.filter_type.label(),
                span.start,
                span.end
            ));
            continue;
        }
        types_at
            .entry((span.start, span.end))
            .or_default()
            .insert(span.filter_type);
        let key = (span.start, span.end, span.filter_type);
        match by_key.get(&key) {
            Some(existing) if existing.confidence >= span.confidence => {}
            _ => {
                by_key.insert(key, span);
            }
        }
    }

    let mut ordered: Vec<Span> = by_key.into_values().collect();
    ordered.sort_by(rank);
    (ordered, warnings, types_at)
}

fn finish(
    mut kept: Vec<Span>,
    warnings: Vec<String>,
    types_at: &BTreeMap<(usize, usize), BTreeSet<FilterType>>,
) -> Resolution {
    kept.sort_by_key(|s| (s.start, s.end));
    for span in &mut kept {
        if let Some(types) = types_at.get(&(span.start, span.end)) {
            span.ambiguous_with = types
                .iter()
                .copied()
                .filter(|t| *t != span.filter_type)
                .collect();
        }
    }
    Resolution { kept, warnings }
}

// =============================================================================
// Interval tree
// =============================================================================

/// Unbalanced augmented interval node: max_end over the subtree prunes
/// overlap queries to O(log n + k) on typical candidate mixes.
struct IntervalNode {
    start: usize,
    end: usize,
    max_end: usize,
    left: Option<Box<IntervalNode>>,
    right: Option<Box<IntervalNode>>,
}

impl IntervalNode {
    fn new(start: usize, end: usize) -> Self {
        IntervalNode {
            start,
            end,
            max_end: end,
            left: None,
            right: None,
        }
    }

    fn insert(&mut self, start: usize, end: usize) {
        if (start, end) < (self.start, self.end) {
            match &mut self.left {
                Some(left) => left.insert(start, end),
                None => self.left = Some(Box::new(IntervalNode::new(start, end))),
            }
        } else {
            match &mut self.right {
                Some(right) => right.insert(start, end),
                None => self.right = Some(Box::new(IntervalNode::new(start, end))),
            }
        }
        self.max_end = self.max_end.max(end);
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        if self.start < end && self.end > start {
            return true;
        }
        if let Some(left) = &self.left {
            if left.max_end > start && left.overlaps(start, end) {
                return true;
            }
        }
        if let Some(right) = &self.right {
            if end > self.start && right.overlaps(start, end) {
                return true;
            }
        }
        false
    }
}

/// Production resolver: greedy selection in score order with interval-tree
/// overlap queries.
pub fn resolve(candidates: Vec<Span>) -> Resolution {
    let (ordered, warnings, types_at) = prepare(candidates);

    let mut kept: Vec<Span> = Vec::with_capacity(ordered.len());
    let mut tree: Option<IntervalNode> = None;
    for span in ordered {
        let overlapping = tree
            .as_ref()
            .map(|t| t.overlaps(span.start, span.end))
            .unwrap_or(false);
        if overlapping {
            continue;
        }
        match &mut tree {
            Some(t) => t.insert(span.start, span.end),
            None => tree = Some(IntervalNode::new(span.start, span.end)),
        }
        kept.push(span);
    }

    finish(kept, warnings, &types_at)
}

/// Cross-validation baseline: identical selection with a linear overlap scan.
pub fn resolve_naive(candidates: Vec<Span>) -> Resolution {
    let (ordered, warnings, types_at) = prepare(candidates);

    let mut kept: Vec<Span> = Vec::with_capacity(ordered.len());
    for span in ordered {
        if kept.iter().any(|k| k.overlaps(&span)) {
            continue;
        }
        kept.push(span);
    }

    finish(kept, warnings, &types_at)
}
