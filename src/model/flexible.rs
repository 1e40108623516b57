//! Flexible string-or-sequence scalar
//!
//! Several StructuredQuery fields (`verb`, `resource`, `namespace`, `user`,
//! `response_status`, `source_ip`, `group_by`) are externally typed as
//! either a single string or an array of strings. We model this as a tagged
//! variant with a canonical sequence view, rather than duck-typing on
//! `serde_json::Value` the way an untyped field would.

use serde::{Deserialize, Serialize};

/// A value that was supplied, externally, as either one scalar or a
/// sequence of scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleScalar {
    One(String),
    Many(Vec<String>),
}

impl FlexibleScalar {
    /// Canonical sequence view, regardless of which wire shape was used.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(s) => std::slice::from_ref(s),
            Self::Many(v) => v.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the canonical sequence form from an iterator of values.
    /// A single remaining element collapses back to `One` so that a
    /// round-trip through a normalizer which drops duplicates or empties
    /// preserves the "single string" wire shape when only one value
    /// survives.
    pub fn from_values<I: IntoIterator<Item = String>>(values: I) -> Option<Self> {
        let mut items: Vec<String> = values.into_iter().collect();
        match items.len() {
            0 => None,
            1 => Some(Self::One(items.pop().unwrap())),
            _ => Some(Self::Many(items)),
        }
    }

    /// Map every element, trimming and dropping blanks, preserving order.
    pub fn map_trim_nonempty<F: Fn(&str) -> String>(&self, f: F) -> Option<Self> {
        let mapped = self
            .as_slice()
            .iter()
            .map(|s| f(s.trim()))
            .filter(|s| !s.is_empty());
        Self::from_values(mapped)
    }

    pub fn contains_duplicates(&self) -> bool {
        let slice = self.as_slice();
        let mut seen = std::collections::HashSet::with_capacity(slice.len());
        for item in slice {
            if !seen.insert(item.to_lowercase()) {
                return true;
            }
        }
        false
    }
}

impl From<&str> for FlexibleScalar {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for FlexibleScalar {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_and_many_share_a_sequence_view() {
        let one = FlexibleScalar::One("get".to_string());
        assert_eq!(one.as_slice(), &["get".to_string()]);

        let many = FlexibleScalar::Many(vec!["get".to_string(), "list".to_string()]);
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn map_trim_nonempty_drops_blanks_and_collapses_singletons() {
        let input = FlexibleScalar::Many(vec!["  patch  ".to_string(), "".to_string()]);
        let mapped = input.map_trim_nonempty(|s| s.to_string()).unwrap();
        assert_eq!(mapped, FlexibleScalar::One("patch".to_string()));
    }

    #[test]
    fn map_trim_nonempty_returns_none_when_everything_is_blank() {
        let input = FlexibleScalar::Many(vec!["   ".to_string(), "".to_string()]);
        assert!(input.map_trim_nonempty(|s| s.to_string()).is_none());
    }

    #[test]
    fn detects_case_insensitive_duplicates() {
        let input = FlexibleScalar::Many(vec!["Get".to_string(), "get".to_string()]);
        assert!(input.contains_duplicates());
    }

    #[test]
    fn serde_roundtrips_scalar_and_sequence_shapes() {
        let scalar: FlexibleScalar = serde_json::from_str("\"get\"").unwrap();
        assert_eq!(scalar, FlexibleScalar::One("get".to_string()));

        let seq: FlexibleScalar = serde_json::from_str("[\"get\",\"list\"]").unwrap();
        assert_eq!(seq, FlexibleScalar::Many(vec!["get".to_string(), "list".to_string()]));
    }
}
