//! Behavioral-analysis domain rules: baseline window membership and the
//! risk_scoring → user_profiling dependency, run by the Rule Engine.

use async_trait::async_trait;

use super::{Rule, RuleCondition};
use crate::error::ErrorCode;
use crate::model::{
    Severity, StructuredQuery, ValidationError, ValidationResult, ALLOWED_BASELINE_WINDOWS,
};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(BaselineWindowEnum), Box::new(RiskScoringRequiresProfiling)]
}

struct BaselineWindowEnum;

#[async_trait]
impl Rule for BaselineWindowEnum {
    fn name(&self) -> &str {
        "behavioral.baseline_window_enum"
    }

    fn description(&self) -> &str {
        "anomaly_detection requires baseline_window to be one of the allowed windows"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("behavioral_analysis"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(behavioral) = &sq.behavioral_analysis else {
            return ValidationResult::ok(self.name());
        };

        if !behavioral.anomaly_detection.unwrap_or(false) {
            return ValidationResult::ok(self.name());
        }

        let Some(window) = &behavioral.baseline_window else {
            return ValidationResult::ok(self.name());
        };

        if !ALLOWED_BASELINE_WINDOWS.contains(&window.as_str()) {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "baseline_window is not a recognized window",
                vec![ValidationError::new(
                    ErrorCode::FieldEnum,
                    "behavioral_analysis.baseline_window",
                    self.severity(),
                )
                .with_expected(ALLOWED_BASELINE_WINDOWS.join(", "))
                .with_actual(window.clone())],
            );
        }

        ValidationResult::ok(self.name())
    }
}

struct RiskScoringRequiresProfiling;

#[async_trait]
impl Rule for RiskScoringRequiresProfiling {
    fn name(&self) -> &str {
        "behavioral.risk_scoring_requires_profiling"
    }

    fn description(&self) -> &str {
        "risk_scoring=true requires user_profiling=true"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["behavioral.baseline_window_enum".to_string()])
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("behavioral_analysis"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(behavioral) = &sq.behavioral_analysis else {
            return ValidationResult::ok(self.name());
        };

        let wants_risk_scoring = behavioral.risk_scoring.unwrap_or(false);
        let has_profiling = behavioral.user_profiling.unwrap_or(false);

        if wants_risk_scoring && !has_profiling {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "risk_scoring requires user_profiling",
                vec![ValidationError::new(
                    ErrorCode::FieldDependency,
                    "behavioral_analysis.user_profiling",
                    self.severity(),
                )
                .with_suggestion("set user_profiling=true alongside risk_scoring")],
            );
        }

        ValidationResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BehavioralAnalysisConfig;

    #[tokio::test]
    async fn risk_scoring_without_profiling_fails() {
        let mut sq = StructuredQuery::empty();
        sq.behavioral_analysis = Some(BehavioralAnalysisConfig {
            baseline_window: Some("30_days".to_string()),
            risk_scoring: Some(true),
            user_profiling: None,
            anomaly_detection: None,
        });
        let result = RiskScoringRequiresProfiling.validate(&sq).await;
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn unknown_baseline_window_fails_when_anomaly_detection_is_set() {
        let mut sq = StructuredQuery::empty();
        sq.behavioral_analysis = Some(BehavioralAnalysisConfig {
            baseline_window: Some("3_days".to_string()),
            risk_scoring: None,
            user_profiling: None,
            anomaly_detection: Some(true),
        });
        let result = BaselineWindowEnum.validate(&sq).await;
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn missing_baseline_window_passes_when_anomaly_detection_is_unset() {
        let mut sq = StructuredQuery::empty();
        sq.behavioral_analysis = Some(BehavioralAnalysisConfig {
            baseline_window: None,
            risk_scoring: None,
            user_profiling: None,
            anomaly_detection: None,
        });
        let result = BaselineWindowEnum.validate(&sq).await;
        assert!(result.is_valid);
    }
}
