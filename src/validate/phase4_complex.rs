//! Phase 4 — Complex Objects (each optional).

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{
    is_apt_analysis_type, Severity, StructuredQuery, ValidationError, ALLOWED_BASELINE_WINDOWS,
    ALLOWED_COMPLIANCE_CONTROLS, ALLOWED_COMPLIANCE_STANDARDS, ALLOWED_CORRELATION_FIELDS,
    ALLOWED_CORRELATION_WINDOWS, ALLOWED_KILL_CHAIN_PHASES, ALLOWED_POD_SECURITY_STANDARDS,
    ALLOWED_TEMPORAL_PATTERN_TYPES,
};

pub(super) fn check(sq: &StructuredQuery, config: &ValidatorConfig) -> PhaseOutcome {
    macro_rules! fail {
        ($code:expr, $field:expr, $($rest:tt)*) => {
            return PhaseOutcome {
                error: Some(ValidationError::new($code, $field, Severity::Error) $($rest)*),
                warnings: Vec::new(),
            }
        };
    }

    if let Some(ms) = &sq.multi_source {
        if !config.allowed_log_sources.iter().any(|s| s == &ms.primary_source) {
            fail!(
                ErrorCode::FieldEnum,
                "multi_source.primary_source",
                .with_expected(config.allowed_log_sources.join(", "))
                    .with_actual(ms.primary_source.clone())
            );
        }
        if ms.secondary_sources.is_empty() {
            fail!(
                ErrorCode::FieldRequired,
                "multi_source.secondary_sources",
                .with_suggestion("list at least one secondary source")
            );
        }
        for secondary in &ms.secondary_sources {
            if secondary == &ms.primary_source {
                fail!(
                    ErrorCode::FieldConflict,
                    "multi_source.secondary_sources",
                    .with_suggestion("secondary sources must differ from primary_source")
                        .with_actual(secondary.clone())
                );
            }
            if !config.allowed_log_sources.iter().any(|s| s == secondary) {
                fail!(
                    ErrorCode::FieldEnum,
                    "multi_source.secondary_sources",
                    .with_expected(config.allowed_log_sources.join(", "))
                        .with_actual(secondary.clone())
                );
            }
        }
        if let Some(window) = &ms.correlation_window {
            if !ALLOWED_CORRELATION_WINDOWS.contains(&window.as_str()) {
                fail!(
                    ErrorCode::FieldEnum,
                    "multi_source.correlation_window",
                    .with_expected(ALLOWED_CORRELATION_WINDOWS.join(", ")).with_actual(window.clone())
                );
            }
        }
        if let Some(fields) = &ms.correlation_fields {
            for field in fields {
                if !ALLOWED_CORRELATION_FIELDS.contains(&field.as_str()) {
                    fail!(
                        ErrorCode::FieldEnum,
                        "multi_source.correlation_fields",
                        .with_expected(ALLOWED_CORRELATION_FIELDS.join(", ")).with_actual(field.clone())
                    );
                }
            }
        }
    }

    if let Some(analysis) = &sq.analysis {
        if is_apt_analysis_type(&analysis.r#type) {
            match &analysis.kill_chain_phase {
                Some(phase) if ALLOWED_KILL_CHAIN_PHASES.contains(&phase.as_str()) => {}
                Some(phase) => fail!(
                    ErrorCode::FieldEnum,
                    "analysis.kill_chain_phase",
                    .with_expected(ALLOWED_KILL_CHAIN_PHASES.join(", ")).with_actual(phase.clone())
                ),
                None => fail!(
                    ErrorCode::FieldDependency,
                    "analysis.kill_chain_phase",
                    .with_suggestion("APT-family analysis types require kill_chain_phase")
                ),
            }
        }
        if let Some(stat) = &analysis.statistical_analysis {
            if let Some(threshold) = stat.pattern_deviation_threshold {
                if !(0.1..=10.0).contains(&threshold) {
                    fail!(
                        ErrorCode::FieldRange,
                        "analysis.statistical_analysis.pattern_deviation_threshold",
                        .with_expected("0.1..=10.0").with_actual(threshold.to_string())
                    );
                }
            }
            if let Some(ci) = stat.confidence_interval {
                if !(0.5..=0.99).contains(&ci) {
                    fail!(
                        ErrorCode::FieldRange,
                        "analysis.statistical_analysis.confidence_interval",
                        .with_expected("0.5..=0.99").with_actual(ci.to_string())
                    );
                }
            }
        }
    }

    if let Some(behavioral) = &sq.behavioral_analysis {
        if behavioral.anomaly_detection.unwrap_or(false) {
            if let Some(window) = &behavioral.baseline_window {
                if !ALLOWED_BASELINE_WINDOWS.contains(&window.as_str()) {
                    fail!(
                        ErrorCode::FieldEnum,
                        "behavioral_analysis.baseline_window",
                        .with_expected(ALLOWED_BASELINE_WINDOWS.join(", "))
                            .with_actual(window.clone())
                    );
                }
            }
        }
        if behavioral.risk_scoring.unwrap_or(false) && !behavioral.user_profiling.unwrap_or(false) {
            fail!(
                ErrorCode::FieldDependency,
                "behavioral_analysis.user_profiling",
                .with_suggestion("risk_scoring requires user_profiling=true")
            );
        }
    }

    if let Some(detection) = &sq.detection_criteria {
        if let Some(rapid) = &detection.rapid_operations {
            if rapid.threshold <= 0.0 {
                fail!(
                    ErrorCode::FieldRange,
                    "detection_criteria.rapid_operations.threshold",
                    .with_expected("> 0").with_actual(rapid.threshold.to_string())
                );
            }
            if !ALLOWED_CORRELATION_WINDOWS.contains(&rapid.time_window.as_str()) {
                fail!(
                    ErrorCode::FieldEnum,
                    "detection_criteria.rapid_operations.time_window",
                    .with_expected(ALLOWED_CORRELATION_WINDOWS.join(", "))
                        .with_actual(rapid.time_window.clone())
                );
            }
        }
    }

    if let Some(compliance) = &sq.compliance_framework {
        for standard in &compliance.standards {
            if !ALLOWED_COMPLIANCE_STANDARDS.contains(&standard.as_str()) {
                fail!(
                    ErrorCode::FieldEnum,
                    "compliance_framework.standards",
                    .with_expected(ALLOWED_COMPLIANCE_STANDARDS.join(", ")).with_actual(standard.clone())
                );
            }
        }
        if let Some(controls) = &compliance.controls {
            for control in controls {
                if !ALLOWED_COMPLIANCE_CONTROLS.contains(&control.as_str()) {
                    fail!(
                        ErrorCode::FieldEnum,
                        "compliance_framework.controls",
                        .with_expected(ALLOWED_COMPLIANCE_CONTROLS.join(", ")).with_actual(control.clone())
                    );
                }
            }
        }
    }

    if let Some(temporal) = &sq.temporal_analysis {
        if !ALLOWED_TEMPORAL_PATTERN_TYPES.contains(&temporal.pattern_type.as_str()) {
            fail!(
                ErrorCode::FieldEnum,
                "temporal_analysis.pattern_type",
                .with_expected(ALLOWED_TEMPORAL_PATTERN_TYPES.join(", "))
                    .with_actual(temporal.pattern_type.clone())
            );
        }
        if temporal.anomaly_threshold != 0.0 && !(0.1..=10.0).contains(&temporal.anomaly_threshold) {
            fail!(
                ErrorCode::FieldRange,
                "temporal_analysis.anomaly_threshold",
                .with_expected("0 (unset) or 0.1..=10.0").with_actual(temporal.anomaly_threshold.to_string())
            );
        }
    }

    if let Some(security_context) = &sq.security_context {
        if let Some(standard) = &security_context.pod_security_standards {
            if !ALLOWED_POD_SECURITY_STANDARDS.contains(&standard.as_str()) {
                fail!(
                    ErrorCode::FieldEnum,
                    "security_context.pod_security_standards",
                    .with_expected(ALLOWED_POD_SECURITY_STANDARDS.join(", ")).with_actual(standard.clone())
                );
            }
        }
    }

    PhaseOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisConfig, BehavioralAnalysisConfig, MultiSourceConfig};

    #[test]
    fn multi_source_secondary_equal_to_primary_conflicts() {
        let mut sq = StructuredQuery::empty();
        sq.multi_source = Some(MultiSourceConfig {
            primary_source: "kube-apiserver".to_string(),
            secondary_sources: vec!["kube-apiserver".to_string()],
            correlation_window: None,
            correlation_fields: None,
        });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldConflict);
    }

    #[test]
    fn apt_analysis_without_kill_chain_is_dependency_error() {
        let mut sq = StructuredQuery::empty();
        sq.analysis = Some(AnalysisConfig {
            r#type: "apt_delivery_detection".to_string(),
            kill_chain_phase: None,
            statistical_analysis: None,
        });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldDependency);
    }

    #[test]
    fn risk_scoring_without_user_profiling_is_dependency_error() {
        let mut sq = StructuredQuery::empty();
        sq.behavioral_analysis = Some(BehavioralAnalysisConfig {
            baseline_window: Some("30_days".to_string()),
            risk_scoring: Some(true),
            user_profiling: Some(false),
            anomaly_detection: None,
        });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldDependency);
    }

    #[test]
    fn missing_baseline_window_is_fine_without_anomaly_detection() {
        let mut sq = StructuredQuery::empty();
        sq.behavioral_analysis = Some(BehavioralAnalysisConfig {
            baseline_window: None,
            risk_scoring: Some(true),
            user_profiling: Some(true),
            anomaly_detection: None,
        });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert!(outcome.error.is_none());
    }
}
