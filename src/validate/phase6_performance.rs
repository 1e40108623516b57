//! Phase 6 — Performance. Never fails; only ever emits warnings.

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{ComplexityLevel, QueryComplexity, Severity, StructuredQuery, ValidationError};

pub(super) fn check(sq: &StructuredQuery, _config: &ValidatorConfig) -> PhaseOutcome {
    let complexity = QueryComplexity::compute(sq);
    let mut warnings = Vec::new();

    if matches!(complexity.level, ComplexityLevel::High) {
        warnings.push(
            ValidationError::new(ErrorCode::PerformanceWarning, "$", Severity::Warning)
                .with_actual(complexity.score.to_string())
                .with_suggestion("query complexity is High; expect higher latency and resource usage"),
        );
    }

    if sq.limit > 500 {
        warnings.push(
            ValidationError::new(ErrorCode::PerformanceWarning, "limit", Severity::Warning)
                .with_actual(sq.limit.to_string())
                .with_suggestion("limits over 500 are expensive to materialize"),
        );
    }

    PhaseOutcome { error: None, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_produces_a_hard_error() {
        let mut sq = StructuredQuery::empty();
        sq.limit = 100_000;
        let outcome = check(&sq, &ValidatorConfig::default());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn large_limit_emits_performance_warning() {
        let mut sq = StructuredQuery::empty();
        sq.limit = 600;
        let outcome = check(&sq, &ValidatorConfig::default());
        assert!(outcome.warnings.iter().any(|w| w.code == ErrorCode::PerformanceWarning));
    }
}
