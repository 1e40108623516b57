//! Diagnostic envelope types returned by the Validator and the Rule Engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ErrorCode;

/// Severity level, ordered `Info < Warning < Error < Critical` so
/// aggregation can take a max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A single structured diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    /// Dotted path, array-indexed where applicable (e.g. `multi_source.secondary_sources[1]`).
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggestion: Option<String>,
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(code: ErrorCode, field: impl Into<String>, severity: Severity) -> Self {
        Self {
            code,
            field: field.into(),
            expected: None,
            actual: None,
            suggestion: None,
            severity,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Outcome envelope produced by a single phase, a single rule, or the
/// aggregated result of a whole Rule Engine evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub warnings: Vec<ValidationError>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    /// Stable digest of the SQ this result was computed against (see
    /// [`crate::rules::cache::stable_digest`]). A non-owning reference: the
    /// caller already holds the SQ itself, so we correlate by digest rather
    /// than cloning or borrowing it into a `'static`-unfriendly envelope.
    #[serde(default)]
    pub query_digest: u64,
}

impl ValidationResult {
    pub fn ok(rule_name: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            rule_name: rule_name.into(),
            severity: Severity::Info,
            message: "OK".to_string(),
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            details: HashMap::new(),
            timestamp: Utc::now(),
            query_digest: 0,
        }
    }

    pub fn with_query_digest(mut self, digest: u64) -> Self {
        self.query_digest = digest;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<ValidationError>) -> Self {
        if !warnings.is_empty() && self.severity < Severity::Warning {
            self.severity = Severity::Warning;
        }
        self.warnings = warnings;
        self
    }

    pub fn failed(
        rule_name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        errors: Vec<ValidationError>,
    ) -> Self {
        Self {
            is_valid: false,
            rule_name: rule_name.into(),
            severity,
            message: message.into(),
            errors,
            warnings: Vec::new(),
            recommendations: Vec::new(),
            details: HashMap::new(),
            timestamp: Utc::now(),
            query_digest: 0,
        }
    }
}
