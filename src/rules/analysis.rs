//! Analysis-family domain rules: APT kill-chain requirements and
//! statistical-analysis consistency, run by the Rule Engine rather than
//! the Schema Validator so they can be independently enabled, prioritized,
//! and depended upon.

use async_trait::async_trait;

use super::{Rule, RuleCondition};
use crate::error::ErrorCode;
use crate::model::{
    is_apt_analysis_type, Severity, StructuredQuery, ValidationError, ValidationResult,
    ALLOWED_STATISTICAL_ANALYSIS_TYPES,
};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(AptKillChainRequired), Box::new(StatisticalAnalysisConsistency)]
}

struct AptKillChainRequired;

#[async_trait]
impl Rule for AptKillChainRequired {
    fn name(&self) -> &str {
        "analysis.apt_kill_chain_required"
    }

    fn description(&self) -> &str {
        "APT-family analysis types must carry a kill_chain_phase"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn priority(&self) -> i32 {
        10
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("analysis"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(analysis) = &sq.analysis else {
            return ValidationResult::ok(self.name());
        };

        if is_apt_analysis_type(&analysis.r#type) && analysis.kill_chain_phase.is_none() {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "APT analysis type is missing kill_chain_phase",
                vec![ValidationError::new(
                    ErrorCode::FieldDependency,
                    "analysis.kill_chain_phase",
                    self.severity(),
                )
                .with_suggestion("set kill_chain_phase for APT-family analysis types")],
            );
        }

        ValidationResult::ok(self.name())
    }
}

struct StatisticalAnalysisConsistency;

#[async_trait]
impl Rule for StatisticalAnalysisConsistency {
    fn name(&self) -> &str {
        "analysis.statistical_consistency"
    }

    fn description(&self) -> &str {
        "statistical_analysis requires a compatible parent analysis.type"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["analysis.apt_kill_chain_required".to_string()])
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("analysis"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(analysis) = &sq.analysis else {
            return ValidationResult::ok(self.name());
        };

        if analysis.statistical_analysis.is_some()
            && !ALLOWED_STATISTICAL_ANALYSIS_TYPES.contains(&analysis.r#type.as_str())
        {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "statistical_analysis present with an incompatible analysis.type",
                vec![ValidationError::new(
                    ErrorCode::FieldDependency,
                    "analysis.statistical_analysis",
                    self.severity(),
                )
                .with_expected(ALLOWED_STATISTICAL_ANALYSIS_TYPES.join(", "))
                .with_actual(analysis.r#type.clone())],
            );
        }

        ValidationResult::ok(self.name())
    }
}
