//! Canonical data model: the Structured Query, its flexible-scalar
//! primitive, complexity scoring, and the diagnostic envelope types.

pub mod complexity;
pub mod flexible;
pub mod query;
pub mod validation;

pub use complexity::{ComplexityLevel, EstimatedResourceUsage, QueryComplexity};
pub use flexible::FlexibleScalar;
pub use query::{
    AnalysisConfig, BehavioralAnalysisConfig, BusinessHours, ComplianceFrameworkConfig,
    DetectionCriteriaConfig, MachineLearningConfig, MultiSourceConfig, RapidOperationsConfig,
    SecurityContextConfig, StatisticalAnalysisConfig, StructuredQuery, TemporalAnalysisConfig,
    ThreatIntelligenceConfig, TimeRange,
};
pub use validation::{Severity, ValidationError, ValidationResult};

/// Allowed `log_source` values.
pub const ALLOWED_LOG_SOURCES: &[&str] = &[
    "kube-apiserver",
    "openshift-apiserver",
    "oauth-server",
    "oauth-apiserver",
    "node-auditd",
];

pub const DEFAULT_LOG_SOURCE: &str = "kube-apiserver";

/// Allowed `timeframe` keyword enum.
pub const ALLOWED_TIMEFRAMES: &[&str] = &[
    "today",
    "yesterday",
    "1_hour_ago",
    "6_hours_ago",
    "12_hours_ago",
    "24_hours_ago",
    "7_days_ago",
    "30_days_ago",
    "last_week",
    "last_month",
];

pub const ALLOWED_AUTH_DECISIONS: &[&str] = &["allow", "error", "forbid"];

pub const ALLOWED_VERBS: &[&str] = &[
    "get", "list", "watch", "create", "update", "patch", "delete", "deletecollection", "proxy",
    "connect", "impersonate",
];

pub const ALLOWED_CORRELATION_WINDOWS: &[&str] =
    &["1_minute", "5_minutes", "15_minutes", "1_hour", "6_hours", "24_hours"];

pub const ALLOWED_CORRELATION_FIELDS: &[&str] =
    &["user", "source_ip", "user_agent", "timestamp", "namespace", "verb", "resource"];

pub const ALLOWED_KILL_CHAIN_PHASES: &[&str] = &[
    "reconnaissance",
    "weaponization",
    "delivery",
    "exploitation",
    "installation",
    "command_control",
    "actions_objectives",
];

pub const ALLOWED_BASELINE_WINDOWS: &[&str] =
    &["7_days", "14_days", "30_days", "60_days", "90_days"];

pub const ALLOWED_COMPLIANCE_STANDARDS: &[&str] =
    &["SOX", "PCI-DSS", "GDPR", "HIPAA", "ISO27001", "NIST", "FedRAMP"];

pub const ALLOWED_COMPLIANCE_CONTROLS: &[&str] = &[
    "AC-1", "AC-2", "AC-3", "AC-6", "AU-2", "AU-3", "AU-6", "AU-9", "CM-5", "IA-2", "SC-7", "SI-4",
];

pub const ALLOWED_TEMPORAL_PATTERN_TYPES: &[&str] =
    &["periodic", "irregular", "trending", "cyclical", "seasonal"];

pub const ALLOWED_POD_SECURITY_STANDARDS: &[&str] = &["privileged", "baseline", "restricted"];

pub const ALLOWED_STATISTICAL_ANALYSIS_TYPES: &[&str] =
    &["statistical_analysis", "anomaly_detection", "behavioral_analysis"];
