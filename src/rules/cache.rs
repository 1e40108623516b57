//! Rule result cache, keyed by `(rule_name, stable digest of SQ)`.
//!
//! A single `RwLock`-guarded map with `Instant`-based TTL, the only
//! mutable shared state the Rule Engine touches.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::model::{FlexibleScalar, StructuredQuery};
use crate::model::ValidationResult;

struct CachedEntry {
    result: ValidationResult,
    inserted_at: Instant,
}

pub struct RuleCache {
    entries: RwLock<HashMap<(String, u64), CachedEntry>>,
    ttl: Duration,
}

impl RuleCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl }
    }

    pub fn get(&self, rule_name: &str, digest: u64) -> Option<ValidationResult> {
        let entries = self.entries.read().expect("rule cache lock poisoned");
        let entry = entries.get(&(rule_name.to_string(), digest))?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn put(&self, rule_name: &str, digest: u64, result: ValidationResult) {
        let mut entries = self.entries.write().expect("rule cache lock poisoned");
        entries.insert((rule_name.to_string(), digest), CachedEntry { result, inserted_at: Instant::now() });
    }
}

/// Deterministic digest of an SQ, stable across logically equivalent
/// shapes: flexible-scalar sequences are sorted before hashing so that
/// `verb=["get","list"]` and `verb=["list","get"]` collide.
pub fn stable_digest(sq: &StructuredQuery) -> u64 {
    let canonical = canonical_json(sq);
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn canonical_json(sq: &StructuredQuery) -> String {
    let mut value = serde_json::to_value(sq).expect("StructuredQuery always serializes");

    if let Some(obj) = value.as_object_mut() {
        for field in [
            "verb",
            "resource",
            "namespace",
            "user",
            "response_status",
            "source_ip",
            "group_by",
        ] {
            if let Some(v) = obj.get_mut(field) {
                sort_flexible_scalar_value(v);
            }
        }
    }

    value.to_string()
}

fn sort_flexible_scalar_value(value: &mut serde_json::Value) {
    if let serde_json::Value::Array(items) = value {
        items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    }
}

/// Canonicalize a [`FlexibleScalar`] the same way, for callers hashing a
/// field in isolation rather than a whole SQ.
pub fn canonical_flexible_scalar(scalar: &FlexibleScalar) -> Vec<String> {
    let mut items: Vec<String> = scalar.as_slice().to_vec();
    items.sort();
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_across_verb_order() {
        let mut a = StructuredQuery::empty();
        a.log_source = "kube-apiserver".to_string();
        a.verb = Some(FlexibleScalar::Many(vec!["get".to_string(), "list".to_string()]));

        let mut b = a.clone();
        b.verb = Some(FlexibleScalar::Many(vec!["list".to_string(), "get".to_string()]));

        assert_eq!(stable_digest(&a), stable_digest(&b));
    }

    #[test]
    fn digest_differs_for_different_log_source() {
        let mut a = StructuredQuery::empty();
        a.log_source = "kube-apiserver".to_string();
        let mut b = a.clone();
        b.log_source = "oauth-server".to_string();
        assert_ne!(stable_digest(&a), stable_digest(&b));
    }

    #[test]
    fn cache_respects_ttl() {
        let cache = RuleCache::new(Duration::from_millis(0));
        cache.put("rule_a", 1, ValidationResult::ok("rule_a"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("rule_a", 1).is_none());
    }

    #[test]
    fn cache_hits_within_ttl() {
        let cache = RuleCache::new(Duration::from_secs(60));
        cache.put("rule_a", 1, ValidationResult::ok("rule_a"));
        assert!(cache.get("rule_a", 1).is_some());
    }
}
