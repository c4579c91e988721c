//! Redaction policy: which identifier types are active and how surviving
//! spans are replaced. Read-only per request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RedactError, Result};
use crate::span::FilterType;

/// Default placeholder format family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementStyle {
    /// `[NAME]`, `[HEALTH-PLAN]`, ...
    Brackets,
    /// `****`
    Asterisks,
    /// Remove the span entirely.
    Empty,
}

impl Default for ReplacementStyle {
    fn default() -> Self {
        ReplacementStyle::Brackets
    }
}

/// Per-type override.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdentifierRule {
    pub enabled: bool,
    /// Exact replacement string; when unset the style default is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

/// Per-request configuration. Build with [`Policy::default`] and adjust, or
/// deserialize from JSON via [`Policy::from_json`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub replacement_style: ReplacementStyle,
    /// Per-type overrides keyed by label (`"SSN"`, `"HEALTH_PLAN"`, ...).
    #[serde(default)]
    pub identifiers: BTreeMap<String, IdentifierRule>,
    /// Toggles the context-aware filter family (ContextAwareName,
    /// RelativeDate, ContextAwareAddress).
    #[serde(default = "default_true")]
    pub context_filters_enabled: bool,
    /// Run a second detection pass over OCR-confusable-normalized text.
    #[serde(default = "default_true")]
    pub ocr_tolerant: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            replacement_style: ReplacementStyle::Brackets,
            identifiers: BTreeMap::new(),
            context_filters_enabled: true,
            ocr_tolerant: true,
        }
    }
}

impl Policy {
    /// Parse and validate a JSON policy document.
    pub fn from_json(json: &str) -> Result<Policy> {
        let policy: Policy = serde_json::from_str(json)
            .map_err(|e| RedactError::PolicyMalformed(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy file. A missing file fails the request before any
    /// processing starts.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Policy> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|_| RedactError::PolicyNotFound(path.display().to_string()))?;
        Policy::from_json(&json)
    }

    /// Reject identifier overrides for labels outside the closed type set.
    pub fn validate(&self) -> Result<()> {
        for label in self.identifiers.keys() {
            if FilterType::from_label(label).is_none() {
                return Err(RedactError::PolicyMalformed(format!(
                    "unknown filter type {label:?}"
                )));
            }
        }
        Ok(())
    }

    /// Disable a single type, leaving everything else untouched.
    pub fn disable(&mut self, ft: FilterType) -> &mut Self {
        self.identifiers.insert(
            ft.label().to_string(),
            IdentifierRule {
                enabled: false,
                replacement: None,
            },
        );
        self
    }

    /// Force a custom replacement for one type.
    pub fn replace_with(&mut self, ft: FilterType, replacement: impl Into<String>) -> &mut Self {
        self.identifiers.insert(
            ft.label().to_string(),
            IdentifierRule {
                enabled: true,
                replacement: Some(replacement.into()),
            },
        );
        self
    }

    pub fn is_enabled(&self, ft: FilterType) -> bool {
        self.identifiers
            .get(ft.label())
            .map(|rule| rule.enabled)
            .unwrap_or(true)
    }

    /// The exact string substituted for a span of this type.
    pub fn replacement_for(&self, ft: FilterType) -> String {
        if let Some(rule) = self.identifiers.get(ft.label()) {
            if let Some(custom) = &rule.replacement {
                return custom.clone();
            }
        }
        match self.replacement_style {
            ReplacementStyle::Brackets => ft.placeholder(),
            ReplacementStyle::Asterisks => "****".to_string(),
            ReplacementStyle::Empty => String::new(),
        }
    }
}
