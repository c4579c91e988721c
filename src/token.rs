//! Pseudonym token hook.
//!
//! Cross-document consistency (same person, same token) lives above the
//! core, but the applier can consult a provider keyed by
//! `(filter_type, normalized value)` so that layer can plug in. The bundled
//! provider derives stable tokens from a keyed HMAC, so equal values map to
//! equal tokens without retaining the values anywhere.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::span::FilterType;

type HmacSha256 = Hmac<Sha256>;

/// External token source consulted per applied span. Returning `None` falls
/// back to the policy replacement.
pub trait TokenProvider: Send + Sync {
    fn token(&self, filter_type: FilterType, normalized_value: &str) -> Option<String>;
}

/// Case-folds and strips separator noise so "John  Smith" and "john smith"
/// key the same token.
pub fn normalize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_space = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Keyed stable pseudonyms: `NAME_4F2A9C61B0D3`.
pub struct HmacTokenProvider {
    key: Vec<u8>,
}

impl HmacTokenProvider {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        HmacTokenProvider { key: key.into() }
    }
}

impl Drop for HmacTokenProvider {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl TokenProvider for HmacTokenProvider {
    fn token(&self, filter_type: FilterType, normalized_value: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(filter_type.label().as_bytes());
        mac.update(b":");
        mac.update(normalized_value.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        Some(format!(
            "{}_{}",
            filter_type.label(),
            digest[..12].to_ascii_uppercase()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_case_and_separators() {
        assert_eq!(normalize_value("John  Smith"), "john smith");
        assert_eq!(normalize_value("SMITH, JOHN"), "smith john");
        assert_eq!(normalize_value("123-45-6789"), "123 45 6789");
    }

    #[test]
    fn equal_values_map_to_equal_tokens() {
        let provider = HmacTokenProvider::new(b"unit-test-key".to_vec());
        let a = provider.token(FilterType::Name, "john smith").unwrap();
        let b = provider.token(FilterType::Name, "john smith").unwrap();
        let c = provider.token(FilterType::Name, "jane smith").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("NAME_"));
    }

    #[test]
    fn tokens_differ_across_types() {
        let provider = HmacTokenProvider::new(b"unit-test-key".to_vec());
        let name = provider.token(FilterType::Name, "smith").unwrap();
        let city = provider.token(FilterType::Address, "smith").unwrap();
        assert_ne!(name, city);
    }
}
