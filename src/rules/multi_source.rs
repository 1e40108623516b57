//! Multi-source correlation domain rules: primary/secondary distinctness
//! and membership, and correlation window/field membership, run by the
//! Rule Engine as pluggable checks layered on top of the Validator's
//! structural phase 4 checks.

use async_trait::async_trait;

use super::{Rule, RuleCondition};
use crate::error::ErrorCode;
use crate::model::{
    Severity, StructuredQuery, ValidationError, ValidationResult, ALLOWED_CORRELATION_FIELDS,
    ALLOWED_CORRELATION_WINDOWS, ALLOWED_LOG_SOURCES,
};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(SourceMembershipAndDistinctness), Box::new(CorrelationMembership)]
}

struct SourceMembershipAndDistinctness;

#[async_trait]
impl Rule for SourceMembershipAndDistinctness {
    fn name(&self) -> &str {
        "multi_source.source_membership_and_distinctness"
    }

    fn description(&self) -> &str {
        "multi_source primary/secondary sources must be known and distinct"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("multi_source"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(multi) = &sq.multi_source else {
            return ValidationResult::ok(self.name());
        };

        if !ALLOWED_LOG_SOURCES.contains(&multi.primary_source.as_str()) {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "multi_source.primary_source is not a recognized log source",
                vec![ValidationError::new(
                    ErrorCode::FieldEnum,
                    "multi_source.primary_source",
                    self.severity(),
                )
                .with_expected(ALLOWED_LOG_SOURCES.join(", "))
                .with_actual(multi.primary_source.clone())],
            );
        }

        let unknown: Vec<&String> = multi
            .secondary_sources
            .iter()
            .filter(|s| !ALLOWED_LOG_SOURCES.contains(&s.as_str()))
            .collect();
        if !unknown.is_empty() {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "multi_source.secondary_sources contains unrecognized sources",
                vec![ValidationError::new(
                    ErrorCode::FieldEnum,
                    "multi_source.secondary_sources",
                    self.severity(),
                )
                .with_expected(ALLOWED_LOG_SOURCES.join(", "))
                .with_actual(unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))],
            );
        }

        if multi.secondary_sources.iter().any(|s| s == &multi.primary_source) {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "multi_source.primary_source must not also appear in secondary_sources",
                vec![ValidationError::new(
                    ErrorCode::FieldConflict,
                    "multi_source.secondary_sources",
                    self.severity(),
                )],
            );
        }

        ValidationResult::ok(self.name())
    }
}

struct CorrelationMembership;

#[async_trait]
impl Rule for CorrelationMembership {
    fn name(&self) -> &str {
        "multi_source.correlation_membership"
    }

    fn description(&self) -> &str {
        "correlation_window and correlation_fields must be recognized values"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["multi_source.source_membership_and_distinctness".to_string()])
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("multi_source"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(multi) = &sq.multi_source else {
            return ValidationResult::ok(self.name());
        };

        if let Some(window) = &multi.correlation_window {
            if !ALLOWED_CORRELATION_WINDOWS.contains(&window.as_str()) {
                return ValidationResult::failed(
                    self.name(),
                    self.severity(),
                    "multi_source.correlation_window is not recognized",
                    vec![ValidationError::new(
                        ErrorCode::FieldEnum,
                        "multi_source.correlation_window",
                        self.severity(),
                    )
                    .with_expected(ALLOWED_CORRELATION_WINDOWS.join(", "))
                    .with_actual(window.clone())],
                );
            }
        }

        if let Some(fields) = &multi.correlation_fields {
            let unknown: Vec<&String> =
                fields.iter().filter(|f| !ALLOWED_CORRELATION_FIELDS.contains(&f.as_str())).collect();
            if !unknown.is_empty() {
                return ValidationResult::failed(
                    self.name(),
                    self.severity(),
                    "multi_source.correlation_fields contains unrecognized fields",
                    vec![ValidationError::new(
                        ErrorCode::FieldEnum,
                        "multi_source.correlation_fields",
                        self.severity(),
                    )
                    .with_expected(ALLOWED_CORRELATION_FIELDS.join(", "))
                    .with_actual(unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))],
                );
            }
        }

        ValidationResult::ok(self.name())
    }
}
