//! Compliance-framework domain rules: standards and controls membership,
//! run by the Rule Engine so a deployment can disable or reprioritize them
//! independently of the Schema Validator's structural phases.

use async_trait::async_trait;

use super::{Rule, RuleCondition};
use crate::error::ErrorCode;
use crate::model::{
    Severity, StructuredQuery, ValidationError, ValidationResult, ALLOWED_COMPLIANCE_CONTROLS,
    ALLOWED_COMPLIANCE_STANDARDS,
};

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(StandardsMembership), Box::new(ControlsMembership)]
}

struct StandardsMembership;

#[async_trait]
impl Rule for StandardsMembership {
    fn name(&self) -> &str {
        "compliance.standards_membership"
    }

    fn description(&self) -> &str {
        "compliance_framework.standards must all be recognized standards"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("compliance_framework"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(framework) = &sq.compliance_framework else {
            return ValidationResult::ok(self.name());
        };

        let unknown: Vec<&String> = framework
            .standards
            .iter()
            .filter(|s| !ALLOWED_COMPLIANCE_STANDARDS.contains(&s.as_str()))
            .collect();

        if !unknown.is_empty() {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "compliance_framework.standards contains unrecognized entries",
                vec![ValidationError::new(
                    ErrorCode::FieldEnum,
                    "compliance_framework.standards",
                    self.severity(),
                )
                .with_expected(ALLOWED_COMPLIANCE_STANDARDS.join(", "))
                .with_actual(unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))],
            );
        }

        ValidationResult::ok(self.name())
    }
}

struct ControlsMembership;

#[async_trait]
impl Rule for ControlsMembership {
    fn name(&self) -> &str {
        "compliance.controls_membership"
    }

    fn description(&self) -> &str {
        "compliance_framework.controls must all be recognized controls"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["compliance.standards_membership".to_string()])
    }

    fn condition(&self) -> Option<RuleCondition> {
        Some(RuleCondition::exists("compliance_framework"))
    }

    async fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let Some(framework) = &sq.compliance_framework else {
            return ValidationResult::ok(self.name());
        };
        let Some(controls) = &framework.controls else {
            return ValidationResult::ok(self.name());
        };

        let unknown: Vec<&String> =
            controls.iter().filter(|c| !ALLOWED_COMPLIANCE_CONTROLS.contains(&c.as_str())).collect();

        if !unknown.is_empty() {
            return ValidationResult::failed(
                self.name(),
                self.severity(),
                "compliance_framework.controls contains unrecognized entries",
                vec![ValidationError::new(
                    ErrorCode::FieldEnum,
                    "compliance_framework.controls",
                    self.severity(),
                )
                .with_expected(ALLOWED_COMPLIANCE_CONTROLS.join(", "))
                .with_actual(unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))],
            );
        }

        ValidationResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComplianceFrameworkConfig;

    #[tokio::test]
    async fn unknown_standard_fails() {
        let mut sq = StructuredQuery::empty();
        sq.compliance_framework =
            Some(ComplianceFrameworkConfig { standards: vec!["SOC2".to_string()], controls: None });
        let result = StandardsMembership.validate(&sq).await;
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn known_standards_and_controls_pass() {
        let mut sq = StructuredQuery::empty();
        sq.compliance_framework = Some(ComplianceFrameworkConfig {
            standards: vec!["PCI-DSS".to_string()],
            controls: Some(vec!["AC-2".to_string()]),
        });
        assert!(StandardsMembership.validate(&sq).await.is_valid);
        assert!(ControlsMembership.validate(&sq).await.is_valid);
    }
}
