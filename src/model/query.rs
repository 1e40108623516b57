//! The canonical Structured Query (SQ) and its optional nested configs.
//!
//! SQ is created fresh by an Extractor, shallow-copied and rewritten by each
//! Normalizer step, and only ever inspected (never mutated) from Validator
//! and Rule Engine onward. It carries no persistent identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flexible::FlexibleScalar;

/// Canonical query consumed by the Schema Validator and Rule Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(default)]
    pub log_source: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timeframe: Option<String>,

    #[serde(default)]
    pub limit: i64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auth_decision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subresource: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub include_changes: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub namespace_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_uri_pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verb: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub namespace: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response_status: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_ip: Option<FlexibleScalar>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_by: Option<FlexibleScalar>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exclude_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exclude_resources: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub business_hours: Option<BusinessHours>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub multi_source: Option<MultiSourceConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub analysis: Option<AnalysisConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub behavioral_analysis: Option<BehavioralAnalysisConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub threat_intelligence: Option<ThreatIntelligenceConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub machine_learning: Option<MachineLearningConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detection_criteria: Option<DetectionCriteriaConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_context: Option<SecurityContextConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compliance_framework: Option<ComplianceFrameworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temporal_analysis: Option<TemporalAnalysisConfig>,

    /// Confidence reported by the Extractor that produced this SQ. Plumbing
    /// for the Retry Orchestrator and caller diagnostics; not itself subject
    /// to any Validator phase and never round-tripped over the wire.
    #[serde(skip)]
    pub source_confidence: Option<f32>,
}

impl StructuredQuery {
    /// An empty SQ with `log_source` left blank, ready for the Normalizer's
    /// default-fill step. This is the shape an Extractor produces before
    /// any field has been discovered.
    pub fn empty() -> Self {
        Self {
            log_source: String::new(),
            timeframe: None,
            limit: 0,
            auth_decision: None,
            subresource: None,
            sort_by: None,
            sort_order: None,
            include_changes: None,
            user_pattern: None,
            namespace_pattern: None,
            resource_name_pattern: None,
            request_uri_pattern: None,
            verb: None,
            resource: None,
            namespace: None,
            user: None,
            response_status: None,
            source_ip: None,
            group_by: None,
            exclude_users: None,
            exclude_resources: None,
            time_range: None,
            business_hours: None,
            multi_source: None,
            analysis: None,
            behavioral_analysis: None,
            threat_intelligence: None,
            machine_learning: None,
            detection_criteria: None,
            security_context: None,
            compliance_framework: None,
            temporal_analysis: None,
            source_confidence: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub start_hour: i32,
    pub end_hour: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outside_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSourceConfig {
    pub primary_source: String,
    pub secondary_sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlation_window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlation_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kill_chain_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statistical_analysis: Option<StatisticalAnalysisConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalAnalysisConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern_deviation_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence_interval: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralAnalysisConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub baseline_window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub risk_scoring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_profiling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anomaly_detection: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatIntelligenceConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ioc_correlation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub feed_sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineLearningConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub feature_engineering: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCriteriaConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rapid_operations: Option<RapidOperationsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RapidOperationsConfig {
    pub threshold: f64,
    pub time_window: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityContextConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pod_security_standards: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFrameworkConfig {
    pub standards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub controls: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnalysisConfig {
    pub pattern_type: String,
    #[serde(default)]
    pub anomaly_threshold: f64,
}

/// Families of the `analysis.type` enum that require `kill_chain_phase`.
pub const APT_ANALYSIS_TYPES: &[&str] = &[
    "apt_reconnaissance_detection",
    "apt_weaponization_detection",
    "apt_delivery_detection",
    "apt_exploitation_detection",
    "apt_installation_detection",
    "apt_command_control_detection",
    "apt_actions_objectives_detection",
];

pub fn is_apt_analysis_type(analysis_type: &str) -> bool {
    APT_ANALYSIS_TYPES.contains(&analysis_type)
}
