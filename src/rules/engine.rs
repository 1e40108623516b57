//! Sequential and bounded-parallel rule evaluation with per-rule timeouts,
//! caching, dependency gating, and fail-fast support.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::cache::stable_digest;
use super::registry::RegistryError;
use super::{aggregate, timeout_result, Rule, RuleCache, RuleRegistry};
use crate::model::{StructuredQuery, ValidationResult};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub parallel: bool,
    pub max_concurrent: usize,
    pub rule_timeout: Duration,
    pub fail_fast: bool,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_concurrent: 4,
            rule_timeout: Duration::from_secs(5),
            fail_fast: false,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("rule engine evaluation was cancelled")]
    Cancelled,
}

pub struct RuleEngine {
    registry: RuleRegistry,
    cache: RuleCache,
    config: EngineConfig,
}

impl RuleEngine {
    /// Validates the dependency graph at construction time — a cyclic
    /// registration fails here, before any evaluation occurs.
    pub fn new(registry: RuleRegistry, config: EngineConfig) -> Result<Self, EngineError> {
        registry.build_levels()?;
        let cache = RuleCache::new(config.cache_ttl);
        Ok(Self { registry, cache, config })
    }

    pub async fn evaluate(
        &self,
        sq: &StructuredQuery,
        cancellation: &CancellationToken,
    ) -> Result<ValidationResult, EngineError> {
        let levels = self.registry.build_levels()?;
        let start = Instant::now();

        let (results, order) = if self.config.parallel {
            self.evaluate_parallel(sq, &levels, cancellation).await?
        } else {
            self.evaluate_sequential(sq, &levels, cancellation).await?
        };

        let executed: Vec<ValidationResult> =
            order.iter().filter_map(|n| results.get(n).cloned()).collect();
        let mut aggregated = aggregate(&executed);
        aggregated
            .details
            .insert("evaluation_order".to_string(), serde_json::to_value(&order).unwrap_or_default());
        aggregated
            .details
            .insert("elapsed_ms".to_string(), serde_json::json!(start.elapsed().as_millis()));
        aggregated.details.insert(
            "mode".to_string(),
            serde_json::json!(if self.config.parallel { "parallel" } else { "sequential" }),
        );
        aggregated
            .details
            .insert("per_rule_results".to_string(), serde_json::to_value(&results).unwrap_or_default());
        Ok(aggregated)
    }

    async fn evaluate_sequential(
        &self,
        sq: &StructuredQuery,
        levels: &[Vec<String>],
        cancellation: &CancellationToken,
    ) -> Result<(HashMap<String, ValidationResult>, Vec<String>), EngineError> {
        let mut results: HashMap<String, ValidationResult> = HashMap::new();
        let mut order = Vec::new();

        for level in levels {
            for name in level {
                if cancellation.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }

                let rule = self.registry.get(name).expect("registry is internally consistent");
                if !self.dependencies_satisfied(&rule, &results) || !self.condition_met(&rule, sq) {
                    continue;
                }

                let result = self.evaluate_one(&rule, sq, cancellation).await?;
                let is_critical_failure =
                    !result.is_valid && result.severity == crate::model::Severity::Critical;
                order.push(name.clone());
                results.insert(name.clone(), result);

                if self.config.fail_fast && is_critical_failure {
                    return Ok((results, order));
                }
            }
        }

        Ok((results, order))
    }

    async fn evaluate_parallel(
        &self,
        sq: &StructuredQuery,
        levels: &[Vec<String>],
        cancellation: &CancellationToken,
    ) -> Result<(HashMap<String, ValidationResult>, Vec<String>), EngineError> {
        let mut results: HashMap<String, ValidationResult> = HashMap::new();
        let mut order = Vec::new();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let digest = stable_digest(sq);

        for level in levels {
            if cancellation.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let runnable: Vec<(String, Arc<dyn Rule>)> = level
                .iter()
                .filter_map(|name| {
                    let rule = self.registry.get(name)?;
                    (self.dependencies_satisfied(&rule, &results) && self.condition_met(&rule, sq))
                        .then(|| (name.clone(), rule))
                })
                .collect();

            let mut joinset: JoinSet<(String, ValidationResult)> = JoinSet::new();
            for (name, rule) in runnable {
                if self.config.cache_enabled {
                    if let Some(cached) = self.cache.get(&name, digest) {
                        joinset.spawn(async move { (name, cached) });
                        continue;
                    }
                }

                let rule_timeout = self.config.rule_timeout;
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                let sq_owned = sq.clone();
                let cancellation = cancellation.clone();

                joinset.spawn(async move {
                    let outcome = tokio::select! {
                        _ = cancellation.cancelled() => timeout_result(&name, stable_digest(&sq_owned)),
                        res = tokio::time::timeout(rule_timeout, rule.validate(&sq_owned)) => {
                            match res {
                                Ok(result) => result,
                                Err(_) => timeout_result(&name, stable_digest(&sq_owned)),
                            }
                        }
                    };
                    drop(permit);
                    (name, outcome)
                });
            }

            let mut level_results: HashMap<String, ValidationResult> = HashMap::new();
            while let Some(joined) = joinset.join_next().await {
                let (name, result) = joined.expect("rule task does not panic under normal operation");
                if self.config.cache_enabled {
                    self.cache.put(&name, digest, result.clone());
                }
                level_results.insert(name, result);
            }

            for name in level {
                if let Some(result) = level_results.remove(name) {
                    order.push(name.clone());
                    results.insert(name.clone(), result);
                }
            }

            if self.config.fail_fast
                && results.values().any(|r| !r.is_valid && r.severity == crate::model::Severity::Critical)
            {
                return Ok((results, order));
            }
        }

        Ok((results, order))
    }

    async fn evaluate_one(
        &self,
        rule: &Arc<dyn Rule>,
        sq: &StructuredQuery,
        cancellation: &CancellationToken,
    ) -> Result<ValidationResult, EngineError> {
        let digest = stable_digest(sq);
        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get(rule.name(), digest) {
                return Ok(cached);
            }
        }

        let result = tokio::select! {
            _ = cancellation.cancelled() => return Err(EngineError::Cancelled),
            res = tokio::time::timeout(self.config.rule_timeout, rule.validate(sq)) => {
                match res {
                    Ok(result) => result,
                    Err(_) => timeout_result(rule.name(), digest),
                }
            }
        };

        if self.config.cache_enabled {
            self.cache.put(rule.name(), digest, result.clone());
        }
        Ok(result)
    }

    fn dependencies_satisfied(&self, rule: &Arc<dyn Rule>, results: &HashMap<String, ValidationResult>) -> bool {
        rule.dependencies().iter().all(|dep| results.get(dep).is_some_and(|r| r.is_valid))
    }

    fn condition_met(&self, rule: &Arc<dyn Rule>, sq: &StructuredQuery) -> bool {
        rule.enabled() && rule.condition().is_none_or(|c| c.is_met(sq))
    }
}
