//! Retry/Recovery Orchestrator: drives extraction through model-specific
//! and generic strategies, falling back to a heuristic SQ synthesis when
//! the retry budget is exhausted.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::ErrorCode;
use crate::extract::{generic::GenericExtractor, select_extractor, ExtractError, Extractor};
use crate::model::{StructuredQuery, ValidationResult, DEFAULT_LOG_SOURCE};
use crate::normalize::normalize_pipeline;
use crate::validate::SchemaValidator;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("model output was empty")]
    EmptyInput,
    #[error("extraction failed fatally: {0}")]
    Fatal(String),
    #[error("parse attempt was cancelled")]
    Cancelled,
}

impl OrchestratorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyInput => ErrorCode::FieldRequired,
            Self::Fatal(_) => ErrorCode::DecodeError,
            Self::Cancelled => ErrorCode::InternalError,
        }
    }
}

/// Runs the full `extract -> normalize -> validate` pipeline with retries,
/// owning the Schema Validator so a caller gets back a ready-to-use
/// [`ValidationResult`] alongside the SQ, not just raw extraction output.
pub struct Orchestrator {
    validator: SchemaValidator,
    retry: RetryConfig,
}

impl Orchestrator {
    pub fn new(validator: SchemaValidator, retry: RetryConfig) -> Self {
        Self { validator, retry }
    }

    pub async fn parse_with_retry(
        &self,
        raw: &str,
        model_id: &str,
        user_query: &str,
        session_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<(StructuredQuery, ValidationResult), OrchestratorError> {
        if raw.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }

        let mut attempted = Vec::new();

        for attempt in 0..=self.retry.max_retries {
            if cancellation.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            if attempt > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(self.retry.retry_delay_ms)) => {}
                    _ = cancellation.cancelled() => return Err(OrchestratorError::Cancelled),
                }
            }

            let extractor: Box<dyn Extractor> =
                if attempt == 0 { select_extractor(model_id) } else { Box::new(GenericExtractor) };

            match extractor.extract(raw) {
                Ok((mut sq, confidence)) => {
                    attempted.push(format!("attempt {attempt}: confidence {confidence:.2}"));
                    if confidence >= self.retry.confidence_threshold {
                        sq.source_confidence = Some(confidence);
                        return Ok(self.finish(sq));
                    }
                }
                Err(err) => {
                    attempted.push(format!("attempt {attempt}: {err}"));
                    if !is_recoverable(&err) {
                        tracing::error!(session_id, error = %err, "extraction failed fatally");
                        return Err(OrchestratorError::Fatal(err.to_string()));
                    }
                    tracing::debug!(session_id, error = %err, "recoverable extraction failure, retrying");
                }
            }
        }

        tracing::warn!(
            session_id,
            attempts = ?attempted,
            "retry budget exhausted, synthesizing fallback query"
        );
        Ok(self.finish(synthesize_fallback(raw, user_query)))
    }

    fn finish(&self, sq: StructuredQuery) -> (StructuredQuery, ValidationResult) {
        let normalized = normalize_pipeline(&sq);
        let result = self.validator.validate(&normalized);
        (normalized, result)
    }
}

fn is_recoverable(err: &ExtractError) -> bool {
    matches!(err, ExtractError::NoJsonFound(_) | ExtractError::DecodeError(_))
}

/// Heuristic fallback SQ: keyword-spot the log source and timeframe out of
/// the raw model text and the original user query, cap at `limit = 20`,
/// and mark the result low-confidence.
fn synthesize_fallback(raw: &str, user_query: &str) -> StructuredQuery {
    let haystack = format!("{} {}", raw.to_lowercase(), user_query.to_lowercase());

    let mut sq = StructuredQuery::empty();
    sq.log_source =
        if haystack.contains("oauth") { "oauth-server".to_string() } else { DEFAULT_LOG_SOURCE.to_string() };

    if haystack.contains("yesterday") {
        sq.timeframe = Some("yesterday".to_string());
    } else if haystack.contains("today") {
        sq.timeframe = Some("today".to_string());
    }

    sq.limit = 20;
    sq.source_confidence = Some(0.1);
    sq
}
