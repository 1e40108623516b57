//! End-to-end scenarios exercised against the public crate API:
//! `extract -> normalize -> validate`, plus the Rule Engine's
//! dependency/timeout/cycle behavior.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use auditsq_core::config::{Config, RetryConfig};
use auditsq_core::model::{Severity, StructuredQuery, ValidationError, ValidationResult};
use auditsq_core::rules::{Rule, RuleCondition};
use auditsq_core::validate::ValidatorConfig;
use auditsq_core::{EngineConfig, EngineError, Orchestrator, RuleEngine, RuleRegistry, SchemaValidator};

fn orchestrator() -> Orchestrator {
    let config = Config::default();
    Orchestrator::new(SchemaValidator::new(ValidatorConfig::from(&config)), config.retry)
}

#[tokio::test]
async fn clean_claude_output_extracts_successfully() {
    let raw = r#"{"log_source": "kube-apiserver", "verb": "get", "resource": "pods", "limit": 20}"#;
    let (sq, result) = orchestrator()
        .parse_with_retry(raw, "claude-3-sonnet", "show me pod reads", "s1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sq.log_source, "kube-apiserver");
    assert_eq!(sq.limit, 20);
    assert!(result.is_valid);
    assert_eq!(result.severity, Severity::Info);
}

#[tokio::test]
async fn ollama_fenced_block_extracts_with_high_confidence() {
    let raw = "Here is the structured query:\n\n```json\n{\n  \"log_source\": \"kube-apiserver\",\n  \"verb\": \"get\",\n  \"resource\": \"pods\",\n  \"limit\": 20\n}\n```";
    let (sq, result) = orchestrator()
        .parse_with_retry(raw, "llama3.1:8b", "show me pod reads", "s2", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sq.log_source, "kube-apiserver");
    assert!(result.is_valid);
    assert!(sq.source_confidence.unwrap_or(0.0) >= 0.8);
}

#[tokio::test]
async fn alias_folding_normalizes_log_source_verbs_and_status_codes() {
    let raw = r#"{"log_source":"OAUTH_API_SERVER","verb":["POST","read","  patch  "],"response_status":["ok","404"]}"#;
    let (sq, _result) = orchestrator()
        .parse_with_retry(raw, "claude-3-sonnet", "oauth activity", "s3", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sq.log_source, "oauth-server");
    assert_eq!(sq.verb.unwrap().as_slice(), &["create".to_string(), "get".to_string(), "patch".to_string()]);
    assert_eq!(sq.response_status.unwrap().as_slice(), &["200".to_string(), "404".to_string()]);
}

#[tokio::test]
async fn reversed_time_range_is_swapped() {
    use chrono::{Duration as ChronoDuration, Utc};
    use auditsq_core::model::TimeRange;

    let now = Utc::now();
    let mut sq = StructuredQuery::empty();
    sq.log_source = "kube-apiserver".to_string();
    sq.time_range = Some(TimeRange { start: now, end: now - ChronoDuration::hours(1) });

    let normalized = auditsq_core::normalize::normalize_pipeline(&sq);
    let range = normalized.time_range.unwrap();
    assert!(range.start <= range.end);

    let validator = SchemaValidator::new(ValidatorConfig::default());
    assert!(validator.validate(&normalized).is_valid);
}

#[tokio::test]
async fn mutually_exclusive_time_fields_conflict() {
    use auditsq_core::model::TimeRange;
    use chrono::Utc;

    let mut sq = StructuredQuery::empty();
    sq.log_source = "kube-apiserver".to_string();
    sq.timeframe = Some("today".to_string());
    sq.time_range = Some(TimeRange { start: Utc::now(), end: Utc::now() + chrono::Duration::hours(2) });

    let validator = SchemaValidator::new(ValidatorConfig::default());
    let result = validator.validate(&sq);
    assert!(!result.is_valid);
    assert_eq!(result.errors[0].code, auditsq_core::ErrorCode::FieldConflict);
    assert_eq!(result.severity, Severity::Error);
}

#[tokio::test]
async fn apt_analysis_missing_kill_chain_phase_is_rejected() {
    use auditsq_core::model::AnalysisConfig;

    let mut sq = StructuredQuery::empty();
    sq.log_source = "kube-apiserver".to_string();
    sq.analysis = Some(AnalysisConfig {
        r#type: "apt_reconnaissance_detection".to_string(),
        kill_chain_phase: None,
        statistical_analysis: None,
    });

    let validator = SchemaValidator::new(ValidatorConfig::default());
    let result = validator.validate(&sq);
    assert!(!result.is_valid);
    assert_eq!(result.errors[0].code, auditsq_core::ErrorCode::FieldDependency);
    assert_eq!(result.errors[0].field, "analysis.kill_chain_phase");
}

struct AlwaysFailsCritical;

#[async_trait]
impl Rule for AlwaysFailsCritical {
    fn name(&self) -> &str {
        "a"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        ValidationResult::failed(
            self.name(),
            Severity::Critical,
            "always fails",
            vec![ValidationError::new(auditsq_core::ErrorCode::InternalError, "a", Severity::Critical)],
        )
    }
}

struct DependsOnA;

#[async_trait]
impl Rule for DependsOnA {
    fn name(&self) -> &str {
        "b"
    }
    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["a".to_string()])
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        ValidationResult::ok(self.name())
    }
}

#[tokio::test]
async fn rule_engine_skips_rules_depending_on_a_failed_rule() {
    let mut registry = RuleRegistry::new();
    registry.register(Box::new(AlwaysFailsCritical)).unwrap();
    registry.register(Box::new(DependsOnA)).unwrap();

    let engine = RuleEngine::new(
        registry,
        EngineConfig { parallel: false, fail_fast: false, ..EngineConfig::default() },
    )
    .unwrap();

    let sq = StructuredQuery::empty();
    let result = engine.evaluate(&sq, &CancellationToken::new()).await.unwrap();

    assert!(!result.is_valid);
    assert_eq!(result.severity, Severity::Critical);
    let per_rule = result.details.get("per_rule_results").unwrap().as_object().unwrap();
    assert!(per_rule.contains_key("a"));
    assert!(!per_rule.contains_key("b"));
}

struct SlowRule;

#[async_trait]
impl Rule for SlowRule {
    fn name(&self) -> &str {
        "slow"
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        tokio::time::sleep(Duration::from_millis(200)).await;
        ValidationResult::ok(self.name())
    }
}

struct FastRule;

#[async_trait]
impl Rule for FastRule {
    fn name(&self) -> &str {
        "fast"
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        ValidationResult::ok(self.name())
    }
}

#[tokio::test]
async fn rule_timeout_produces_synthetic_critical_result() {
    let mut registry = RuleRegistry::new();
    registry.register(Box::new(SlowRule)).unwrap();
    registry.register(Box::new(FastRule)).unwrap();

    let engine = RuleEngine::new(
        registry,
        EngineConfig { rule_timeout: Duration::from_millis(20), ..EngineConfig::default() },
    )
    .unwrap();

    let sq = StructuredQuery::empty();
    let result = engine.evaluate(&sq, &CancellationToken::new()).await.unwrap();

    let per_rule = result.details.get("per_rule_results").unwrap().as_object().unwrap();
    let slow = &per_rule["slow"];
    assert_eq!(slow["is_valid"], false);
    assert_eq!(slow["severity"], "critical");
    assert!(slow["message"].as_str().unwrap().to_lowercase().contains("timeout"));
    assert_eq!(per_rule["fast"]["is_valid"], true);
}

struct StubX;
struct StubY;

#[async_trait]
impl Rule for StubX {
    fn name(&self) -> &str {
        "x"
    }
    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["y".to_string()])
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        ValidationResult::ok(self.name())
    }
}

#[async_trait]
impl Rule for StubY {
    fn name(&self) -> &str {
        "y"
    }
    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["x".to_string()])
    }
    async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
        ValidationResult::ok(self.name())
    }
}

#[test]
fn circular_dependency_fails_at_construction() {
    let mut registry = RuleRegistry::new();
    registry.register(Box::new(StubX)).unwrap();
    registry.register(Box::new(StubY)).unwrap();

    let err = RuleEngine::new(registry, EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::Registry(_)));
}

#[tokio::test]
async fn fallback_synthesis_recovers_timeframe_and_log_source() {
    let (sq, _result) = orchestrator()
        .parse_with_retry("yesterday's logs", "claude-3-sonnet", "yesterday's logs", "s10", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sq.log_source, "kube-apiserver");
    assert_eq!(sq.timeframe.as_deref(), Some("yesterday"));
    assert_eq!(sq.limit, 20);
}

#[allow(unused)]
fn unused_condition_reference(sq: &StructuredQuery) -> bool {
    RuleCondition::exists("analysis").is_met(sq)
}
