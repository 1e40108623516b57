//! Phase 1 — Required Fields.

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{Severity, StructuredQuery, ValidationError};

pub(super) fn check(sq: &StructuredQuery, config: &ValidatorConfig) -> PhaseOutcome {
    let trimmed = sq.log_source.trim();

    if trimmed.is_empty() {
        return PhaseOutcome {
            error: Some(
                ValidationError::new(ErrorCode::FieldRequired, "log_source", Severity::Error)
                    .with_suggestion("set log_source to one of the allowed audit log streams"),
            ),
            warnings: Vec::new(),
        };
    }

    if !config.allowed_log_sources.iter().any(|s| s == trimmed) {
        return PhaseOutcome {
            error: Some(
                ValidationError::new(ErrorCode::FieldEnum, "log_source", Severity::Error)
                    .with_expected(config.allowed_log_sources.join(", "))
                    .with_actual(trimmed.to_string())
                    .with_suggestion("choose a log_source from the allowed set"),
            ),
            warnings: Vec::new(),
        };
    }

    PhaseOutcome::ok()
}
