//! Rule Engine: a dependency- and priority-ordered evaluator for pluggable
//! domain rules. Rules are pure with respect to SQ — `validate`
//! takes `&StructuredQuery` and never mutates it.

pub mod analysis;
pub mod behavioral;
pub mod cache;
pub mod compliance;
pub mod engine;
pub mod multi_source;
pub mod registry;

pub use cache::RuleCache;
pub use engine::{EngineConfig, EngineError, RuleEngine};
pub use registry::{RegistryError, RuleRegistry};

use async_trait::async_trait;

use crate::model::{Severity, StructuredQuery, ValidationError, ValidationResult};

/// Condition operators a rule may gate its activation on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOp {
    Eq,
    Ne,
    In,
    NotIn,
    Exists,
    NotExists,
}

/// A condition over a query field. `Exists`/`NotExists` test presence of an
/// optional sub-object; the rest compare a named scalar field's value.
#[derive(Debug, Clone)]
pub struct RuleCondition {
    pub field: String,
    pub op: ConditionOp,
    pub values: Vec<String>,
}

impl RuleCondition {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), op: ConditionOp::Eq, values: vec![value.into()] }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self { field: field.into(), op: ConditionOp::Exists, values: Vec::new() }
    }

    pub fn not_exists(field: impl Into<String>) -> Self {
        Self { field: field.into(), op: ConditionOp::NotExists, values: Vec::new() }
    }

    pub fn in_set(field: impl Into<String>, values: Vec<String>) -> Self {
        Self { field: field.into(), op: ConditionOp::In, values }
    }

    /// Whether `sq` satisfies this condition. An unmet condition means the
    /// owning rule is silently skipped.
    pub fn is_met(&self, sq: &StructuredQuery) -> bool {
        match self.op {
            ConditionOp::Exists => sub_object_present(sq, &self.field),
            ConditionOp::NotExists => !sub_object_present(sq, &self.field),
            ConditionOp::Eq | ConditionOp::Ne | ConditionOp::In | ConditionOp::NotIn => {
                let Some(actual) = scalar_field(sq, &self.field) else { return false };
                match self.op {
                    ConditionOp::Eq => self.values.first().is_some_and(|v| v == &actual),
                    ConditionOp::Ne => self.values.first().is_some_and(|v| v != &actual),
                    ConditionOp::In => self.values.iter().any(|v| v == &actual),
                    ConditionOp::NotIn => self.values.iter().all(|v| v != &actual),
                    ConditionOp::Exists | ConditionOp::NotExists => unreachable!(),
                }
            }
        }
    }
}

fn sub_object_present(sq: &StructuredQuery, field: &str) -> bool {
    match field {
        "time_range" => sq.time_range.is_some(),
        "business_hours" => sq.business_hours.is_some(),
        "multi_source" => sq.multi_source.is_some(),
        "analysis" => sq.analysis.is_some(),
        "behavioral_analysis" => sq.behavioral_analysis.is_some(),
        "threat_intelligence" => sq.threat_intelligence.is_some(),
        "machine_learning" => sq.machine_learning.is_some(),
        "detection_criteria" => sq.detection_criteria.is_some(),
        "security_context" => sq.security_context.is_some(),
        "compliance_framework" => sq.compliance_framework.is_some(),
        "temporal_analysis" => sq.temporal_analysis.is_some(),
        _ => false,
    }
}

fn scalar_field(sq: &StructuredQuery, field: &str) -> Option<String> {
    match field {
        "log_source" => Some(sq.log_source.clone()),
        "timeframe" => sq.timeframe.clone(),
        "auth_decision" => sq.auth_decision.clone(),
        "subresource" => sq.subresource.clone(),
        "sort_by" => sq.sort_by.clone(),
        "sort_order" => sq.sort_order.clone(),
        _ => None,
    }
}

/// Capability set every rule implements: `{name, severity,
/// enabled, validate}`, plus registration metadata (dependencies, priority,
/// condition) the registry and engine consult.
#[async_trait]
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn enabled(&self) -> bool {
        true
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    fn priority(&self) -> i32 {
        0
    }

    fn condition(&self) -> Option<RuleCondition> {
        None
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult;
}

/// Merge a set of executed rule results into one aggregated envelope.
/// Pure function of its inputs.
pub fn aggregate(results: &[ValidationResult]) -> ValidationResult {
    let is_valid = results.iter().all(|r| r.is_valid);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    for result in results {
        errors.extend(result.errors.iter().cloned());
        warnings.extend(result.warnings.iter().cloned());
        recommendations.extend(result.recommendations.iter().cloned());
    }

    let any_critical = results.iter().any(|r| !r.is_valid && r.severity == Severity::Critical);
    let severity = if any_critical {
        Severity::Critical
    } else if !is_valid {
        Severity::Error
    } else if !warnings.is_empty() {
        Severity::Warning
    } else {
        Severity::Info
    };

    let message = if is_valid {
        "all rules passed".to_string()
    } else {
        format!(
            "{} of {} rules failed",
            results.iter().filter(|r| !r.is_valid).count(),
            results.len()
        )
    };

    ValidationResult {
        is_valid,
        rule_name: "rule_engine".to_string(),
        severity,
        message,
        errors,
        warnings,
        recommendations,
        details: std::collections::HashMap::new(),
        timestamp: chrono::Utc::now(),
        query_digest: results.first().map(|r| r.query_digest).unwrap_or(0),
    }
}

/// Register every pluggable domain rule set (analysis, behavioral,
/// compliance, multi_source) into a fresh registry, aggregating each
/// module's `rules()` function behind a single entry point.
pub fn default_registry() -> Result<RuleRegistry, RegistryError> {
    let mut registry = RuleRegistry::new();
    for rule in analysis::rules()
        .into_iter()
        .chain(behavioral::rules())
        .chain(compliance::rules())
        .chain(multi_source::rules())
    {
        registry.register(rule)?;
    }
    Ok(registry)
}

pub(crate) fn timeout_result(rule_name: &str, query_digest: u64) -> ValidationResult {
    ValidationResult::failed(
        rule_name,
        Severity::Critical,
        "Rule evaluation timeout",
        vec![ValidationError::new(
            crate::error::ErrorCode::InternalError,
            rule_name,
            Severity::Critical,
        )
        .with_suggestion("rule exceeded its evaluation deadline")],
    )
    .with_query_digest(query_digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_condition_checks_sub_object_presence() {
        let mut sq = StructuredQuery::empty();
        let cond = RuleCondition::exists("analysis");
        assert!(!cond.is_met(&sq));
        sq.analysis = Some(crate::model::AnalysisConfig {
            r#type: "apt_delivery_detection".to_string(),
            kill_chain_phase: None,
            statistical_analysis: None,
        });
        assert!(cond.is_met(&sq));
    }

    #[test]
    fn eq_condition_compares_named_scalar() {
        let mut sq = StructuredQuery::empty();
        sq.log_source = "node-auditd".to_string();
        let cond = RuleCondition::eq("log_source", "node-auditd");
        assert!(cond.is_met(&sq));
    }

    #[test]
    fn aggregate_is_valid_iff_all_results_are() {
        let ok = ValidationResult::ok("a");
        let failed = ValidationResult::failed(
            "b",
            Severity::Critical,
            "boom",
            vec![ValidationError::new(crate::error::ErrorCode::InternalError, "x", Severity::Critical)],
        );
        let merged = aggregate(&[ok, failed]);
        assert!(!merged.is_valid);
        assert_eq!(merged.severity, Severity::Critical);
    }

    #[test]
    fn default_registry_has_no_cycles_or_unknown_deps() {
        let registry = default_registry().unwrap();
        assert!(registry.build_levels().is_ok());
        assert!(registry.len() >= 8);
    }
}
