//! Phase 5 — Cross-Field Dependencies.
//!
//! APT-requires-kill_chain_phase and risk_scoring-requires-user_profiling
//! are enforced in phase 4 alongside their owning sub-object; this phase
//! covers the dependencies that don't already have a natural home there.

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{Severity, StructuredQuery, ValidationError, ALLOWED_STATISTICAL_ANALYSIS_TYPES};

pub(super) fn check(sq: &StructuredQuery, _config: &ValidatorConfig) -> PhaseOutcome {
    macro_rules! fail {
        ($code:expr, $field:expr, $($rest:tt)*) => {
            return PhaseOutcome {
                error: Some(ValidationError::new($code, $field, Severity::Error) $($rest)*),
                warnings: Vec::new(),
            }
        };
    }

    if sq.timeframe.as_deref().is_some_and(|t| !t.is_empty()) && sq.time_range.is_some() {
        fail!(
            ErrorCode::FieldConflict,
            "timeframe,time_range",
            .with_suggestion("timeframe and time_range are mutually exclusive; set only one")
        );
    }

    match sq.log_source.as_str() {
        "node-auditd" => {
            if sq.verb.is_some() {
                fail!(
                    ErrorCode::FieldConflict,
                    "verb",
                    .with_suggestion("node-auditd forbids verb")
                );
            }
            if sq.resource.is_some() {
                fail!(
                    ErrorCode::FieldConflict,
                    "resource",
                    .with_suggestion("node-auditd forbids resource")
                );
            }
            if sq.auth_decision.is_some() {
                fail!(
                    ErrorCode::FieldConflict,
                    "auth_decision",
                    .with_suggestion("node-auditd forbids auth_decision")
                );
            }
        }
        "oauth-server" => {
            if sq.resource.is_some() {
                fail!(
                    ErrorCode::FieldConflict,
                    "resource",
                    .with_suggestion("oauth-server forbids resource")
                );
            }
        }
        "kube-apiserver" | "openshift-apiserver" => {
            if sq.auth_decision.is_some() {
                fail!(
                    ErrorCode::FieldConflict,
                    "auth_decision",
                    .with_suggestion("kube-apiserver and openshift-apiserver forbid auth_decision")
                );
            }
        }
        _ => {}
    }

    if let Some(analysis) = &sq.analysis {
        if analysis.statistical_analysis.is_some()
            && !ALLOWED_STATISTICAL_ANALYSIS_TYPES.contains(&analysis.r#type.as_str())
        {
            fail!(
                ErrorCode::FieldDependency,
                "analysis.statistical_analysis",
                .with_suggestion(format!(
                    "statistical_analysis requires analysis.type in {}",
                    ALLOWED_STATISTICAL_ANALYSIS_TYPES.join(", ")
                ))
            );
        }
    }

    if let Some(behavioral) = &sq.behavioral_analysis {
        if behavioral.anomaly_detection.unwrap_or(false) && behavioral.baseline_window.is_none() {
            fail!(
                ErrorCode::FieldDependency,
                "behavioral_analysis.baseline_window",
                .with_suggestion("anomaly_detection requires baseline_window to be set")
            );
        }
    }

    if let Some(ml) = &sq.machine_learning {
        if ml.feature_engineering.unwrap_or(false) && ml.model_type.is_none() {
            fail!(
                ErrorCode::FieldDependency,
                "machine_learning.model_type",
                .with_suggestion("feature_engineering requires model_type to be set")
            );
        }
    }

    if let Some(ti) = &sq.threat_intelligence {
        if ti.ioc_correlation.unwrap_or(false)
            && ti.feed_sources.as_ref().is_none_or(|sources| sources.is_empty())
        {
            fail!(
                ErrorCode::FieldDependency,
                "threat_intelligence.feed_sources",
                .with_suggestion("ioc_correlation requires at least one feed source")
            );
        }
    }

    PhaseOutcome::ok()
}
