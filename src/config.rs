//! Configuration for the audit-query core.
//!
//! Follows the per-section, all-`#[serde(default)]` shape so any
//! key a caller omits from their YAML falls back to a sensible default
//! rather than failing to deserialize.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::model::{
    ALLOWED_AUTH_DECISIONS, ALLOWED_LOG_SOURCES, ALLOWED_TIMEFRAMES, ALLOWED_VERBS,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rule_engine: RuleEngineConfig,
    pub retry: RetryConfig,
    pub allowed_log_sources: Vec<String>,
    pub allowed_verbs: Vec<String>,
    pub allowed_timeframes: Vec<String>,
    pub allowed_auth_decisions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_engine: RuleEngineConfig::default(),
            retry: RetryConfig::default(),
            allowed_log_sources: owned(ALLOWED_LOG_SOURCES),
            allowed_verbs: owned(ALLOWED_VERBS),
            allowed_timeframes: owned(ALLOWED_TIMEFRAMES),
            allowed_auth_decisions: owned(ALLOWED_AUTH_DECISIONS),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a YAML file, falling back to defaults for
    /// any key the file omits.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("failed to parse config YAML: {0}")]
    Parse(#[source] serde_yaml::Error),
}

/// `rule_engine.*` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleEngineConfig {
    pub parallel: bool,
    pub max_concurrent: usize,
    pub rule_timeout_seconds: u64,
    pub fail_fast: bool,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub priorities: HashMap<String, i32>,
}

impl Default for RuleEngineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_concurrent: 4,
            rule_timeout_seconds: 5,
            fail_fast: false,
            cache_enabled: true,
            cache_ttl_seconds: 60,
            priorities: HashMap::new(),
        }
    }
}

/// `retry.*` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub confidence_threshold: f32,
    /// Accepted for forward compatibility; has no behavioral effect here.
    pub enable_reprompting: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 200,
            confidence_threshold: 0.5,
            enable_reprompting: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_allowed_value_sets() {
        let config = Config::default();
        assert!(config.allowed_log_sources.contains(&"kube-apiserver".to_string()));
        assert_eq!(config.rule_engine.max_concurrent, 4);
        assert!(!config.retry.enable_reprompting);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let yaml = "rule_engine:\n  parallel: true\n  max_concurrent: 8\n";
        let config = Config::from_yaml_str(yaml).unwrap();
        assert!(config.rule_engine.parallel);
        assert_eq!(config.rule_engine.max_concurrent, 8);
        assert_eq!(config.rule_engine.rule_timeout_seconds, 5);
        assert!(config.allowed_log_sources.contains(&"node-auditd".to_string()));
    }
}
