//! Deterministic query complexity scoring.
//!
//! Scores a Structured Query's populated fields the way a query-profile
//! analyzer scores an operator tree: an integer score, a level enum, and a
//! named contributor breakdown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::query::StructuredQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedResourceUsage {
    pub memory_mb: u32,
    pub cpu_cores: u32,
    pub network_mb: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryComplexity {
    pub score: u32,
    pub level: ComplexityLevel,
    pub breakdown: HashMap<String, u32>,
    pub warnings: Vec<String>,
    pub estimated_usage: EstimatedResourceUsage,
}

impl QueryComplexity {
    /// Compute the complexity of an SQ. Never mutates `sq`.
    ///
    /// Scoring rules:
    /// - each basic filter present: +1; `time_range`: +2
    /// - each regex pattern present: +3
    /// - `multi_source`: +5 + |secondary_sources|
    /// - `analysis`: +10, +5 if statistical
    /// - `behavioral_analysis`: +8, +3 if risk_scoring
    /// - `machine_learning`: +15; `threat_intelligence`: +12;
    ///   `detection_criteria`: +6; `security_context`: +4;
    ///   `compliance_framework`: +7; `temporal_analysis`: +9
    /// - `limit > 100`: +2
    pub fn compute(sq: &StructuredQuery) -> Self {
        let mut breakdown: HashMap<String, u32> = HashMap::new();
        let mut warnings = Vec::new();
        let mut add = |name: &str, points: u32| {
            if points > 0 {
                *breakdown.entry(name.to_string()).or_insert(0) += points;
            }
        };

        for (name, present) in [
            ("timeframe", sq.timeframe.is_some()),
            ("auth_decision", sq.auth_decision.is_some()),
            ("subresource", sq.subresource.is_some()),
            ("sort_by", sq.sort_by.is_some()),
            ("verb", sq.verb.is_some()),
            ("resource", sq.resource.is_some()),
            ("namespace", sq.namespace.is_some()),
            ("user", sq.user.is_some()),
            ("response_status", sq.response_status.is_some()),
            ("source_ip", sq.source_ip.is_some()),
            ("group_by", sq.group_by.is_some()),
        ] {
            if present {
                add(name, 1);
            }
        }

        if sq.time_range.is_some() {
            add("time_range", 2);
        }

        for pattern in [
            &sq.user_pattern,
            &sq.namespace_pattern,
            &sq.resource_name_pattern,
            &sq.request_uri_pattern,
        ] {
            if pattern.is_some() {
                add("regex_pattern", 3);
            }
        }

        if let Some(ms) = &sq.multi_source {
            add("multi_source", 5 + ms.secondary_sources.len() as u32);
        }

        if let Some(analysis) = &sq.analysis {
            let mut points = 10;
            if analysis.statistical_analysis.is_some() {
                points += 5;
            }
            add("analysis", points);
        }

        if let Some(behavioral) = &sq.behavioral_analysis {
            let mut points = 8;
            if behavioral.risk_scoring.unwrap_or(false) {
                points += 3;
            }
            add("behavioral_analysis", points);
        }

        if sq.machine_learning.is_some() {
            add("machine_learning", 15);
        }
        if sq.threat_intelligence.is_some() {
            add("threat_intelligence", 12);
        }
        if sq.detection_criteria.is_some() {
            add("detection_criteria", 6);
        }
        if sq.security_context.is_some() {
            add("security_context", 4);
        }
        if sq.compliance_framework.is_some() {
            add("compliance_framework", 7);
        }
        if sq.temporal_analysis.is_some() {
            add("temporal_analysis", 9);
        }

        if sq.limit > 100 {
            add("limit_over_100", 2);
        }

        let score: u32 = breakdown.values().sum();
        let level = if score < 20 {
            ComplexityLevel::Low
        } else if score < 50 {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::High
        };

        if matches!(level, ComplexityLevel::High) {
            warnings.push(format!("query complexity score {score} is High; expect higher latency and resource usage"));
        }
        if sq.limit > 500 {
            warnings.push(format!("limit {} exceeds 500; large result sets are expensive to materialize", sq.limit));
        }

        let estimated_usage = EstimatedResourceUsage {
            memory_mb: 64 + score * 4,
            cpu_cores: 1 + score / 25,
            network_mb: 16 + score * 2,
        };

        Self { score, level, breakdown, warnings, estimated_usage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_low_complexity() {
        let sq = StructuredQuery::empty();
        let complexity = QueryComplexity::compute(&sq);
        assert_eq!(complexity.score, 0);
        assert_eq!(complexity.level, ComplexityLevel::Low);
    }

    #[test]
    fn adding_an_optional_sub_object_never_decreases_the_score() {
        let mut sq = StructuredQuery::empty();
        let base = QueryComplexity::compute(&sq).score;

        sq.machine_learning = Some(crate::model::query::MachineLearningConfig {
            feature_engineering: None,
            model_type: None,
        });
        let with_ml = QueryComplexity::compute(&sq).score;
        assert!(with_ml >= base);
        assert_eq!(with_ml - base, 15);
    }

    #[test]
    fn limit_over_500_emits_a_performance_warning() {
        let mut sq = StructuredQuery::empty();
        sq.limit = 600;
        let complexity = QueryComplexity::compute(&sq);
        assert!(complexity.warnings.iter().any(|w| w.contains("500")));
    }
}
