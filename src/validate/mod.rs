//! Six-phase Schema Validator. Phases run in strict order;
//! each phase short-circuits on its first hard error. The whole validator
//! stops at the first phase that fails — later phases assume everything
//! checked so far holds — but still runs every phase when nothing fails,
//! accumulating warnings (which never halt) along the way.

mod phase1_required;
mod phase2_basic;
mod phase3_advanced;
mod phase4_complex;
mod phase5_dependencies;
mod phase6_performance;

use crate::config::Config;
use crate::model::{
    StructuredQuery, ValidationError, ValidationResult, ALLOWED_AUTH_DECISIONS,
    ALLOWED_LOG_SOURCES, ALLOWED_TIMEFRAMES, ALLOWED_VERBS,
};
use crate::rules::cache::stable_digest;

/// Allow-lists the validator checks field values against. Defaults to the
/// standard enumerated sets; a [`Config`] can narrow or widen them.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub allowed_log_sources: Vec<String>,
    pub allowed_verbs: Vec<String>,
    pub allowed_timeframes: Vec<String>,
    pub allowed_auth_decisions: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_log_sources: ALLOWED_LOG_SOURCES.iter().map(|s| s.to_string()).collect(),
            allowed_verbs: ALLOWED_VERBS.iter().map(|s| s.to_string()).collect(),
            allowed_timeframes: ALLOWED_TIMEFRAMES.iter().map(|s| s.to_string()).collect(),
            allowed_auth_decisions: ALLOWED_AUTH_DECISIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&Config> for ValidatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            allowed_log_sources: config.allowed_log_sources.clone(),
            allowed_verbs: config.allowed_verbs.clone(),
            allowed_timeframes: config.allowed_timeframes.clone(),
            allowed_auth_decisions: config.allowed_auth_decisions.clone(),
        }
    }
}

/// Outcome of a single phase: at most one hard error (the phase
/// short-circuits on its first), plus any number of warnings.
pub(crate) struct PhaseOutcome {
    pub error: Option<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl PhaseOutcome {
    fn ok() -> Self {
        Self { error: None, warnings: Vec::new() }
    }
}

pub struct SchemaValidator {
    config: ValidatorConfig,
}

impl SchemaValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, sq: &StructuredQuery) -> ValidationResult {
        let digest = stable_digest(sq);
        let phases: [(&str, fn(&StructuredQuery, &ValidatorConfig) -> PhaseOutcome); 6] = [
            ("required_fields", phase1_required::check),
            ("basic_fields", phase2_basic::check),
            ("advanced_fields", phase3_advanced::check),
            ("complex_objects", phase4_complex::check),
            ("cross_field_dependencies", phase5_dependencies::check),
            ("performance", phase6_performance::check),
        ];

        let mut warnings = Vec::new();
        for (phase_name, check) in phases {
            let outcome = check(sq, &self.config);
            warnings.extend(outcome.warnings);

            if let Some(error) = outcome.error {
                let severity = error.severity;
                return ValidationResult::failed(
                    phase_name,
                    severity,
                    format!("validation failed in phase `{phase_name}`"),
                    vec![error],
                )
                .with_query_digest(digest)
                .with_warnings(warnings);
            }
        }

        ValidationResult::ok("schema_validator").with_query_digest(digest).with_warnings(warnings)
    }
}
