//! Extraction strategies per model family.
//!
//! Each extractor isolates a JSON object from raw model text and decodes it
//! into an SQ, reporting a confidence in `[0,1]`. The balanced-brace scanner
//! is shared across strategies; only the preprocessing (fence stripping,
//! tag stripping) differs per family.

pub mod claude;
pub mod generic;
pub mod ollama;
pub mod openai;

use crate::error::ErrorCode;
use crate::model::{StructuredQuery, ALLOWED_LOG_SOURCES};

/// Extractor-local failure. Carries the same closed `ErrorCode` taxonomy
/// the Validator and Rule Engine use.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object found in {0} bytes of model output")]
    NoJsonFound(usize),
    #[error("found a JSON candidate but it failed to decode into a structured query: {0}")]
    DecodeError(#[from] serde_json::Error),
    #[error("model id {0:?} is not supported by this extractor")]
    UnsupportedModel(String),
}

impl ExtractError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoJsonFound(_) => ErrorCode::NoJsonFound,
            Self::DecodeError(_) => ErrorCode::DecodeError,
            Self::UnsupportedModel(_) => ErrorCode::UnsupportedModel,
        }
    }
}

/// A model-family-specific extraction strategy.
pub trait Extractor: Send + Sync {
    /// Whether this extractor claims the given model id.
    fn supports_model(&self, model_id: &str) -> bool;

    /// Extract an SQ and its confidence from raw model output.
    fn extract(&self, raw: &str) -> Result<(StructuredQuery, f32), ExtractError>;
}

/// Select the extractor whose model-id pattern matches, falling back to
/// [`generic::GenericExtractor`] when nothing else claims it.
pub fn select_extractor(model_id: &str) -> Box<dyn Extractor> {
    let claude = claude::ClaudeExtractor;
    let openai = openai::OpenAiExtractor;
    let ollama = ollama::OllamaExtractor;

    if claude.supports_model(model_id) {
        Box::new(claude)
    } else if openai.supports_model(model_id) {
        Box::new(openai)
    } else if ollama.supports_model(model_id) {
        Box::new(ollama)
    } else {
        Box::new(generic::GenericExtractor)
    }
}

/// Raw decode shape mirroring [`StructuredQuery`] exactly; extraction
/// decodes into this first so `serde_json` error messages stay field-level
/// rather than bubbling up from a hand-rolled `Value` walk.
pub(crate) fn decode_candidate(candidate: &str) -> Result<StructuredQuery, ExtractError> {
    serde_json::from_str::<StructuredQuery>(candidate).map_err(ExtractError::DecodeError)
}

/// Find every balanced `{ ... }` region in `text`, respecting string
/// literals and escape sequences, returning them in the order found.
/// Grounded on the pack's depth-aware brace matcher, generalized to collect
/// every candidate (not just the first) so callers can try the largest
/// first and fall back on decode failure.
pub fn find_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let bytes = text.as_bytes();
    let mut search_from = 0usize;

    while let Some(rel_start) = text[search_from..].find('{') {
        let start = search_from + rel_start;
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape_next = false;
        let mut end = None;

        for (i, ch) in text[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(start + i + ch.len_utf8());
                        break;
                    }
                }
                _ => {}
            }
        }

        match end {
            Some(end) => {
                candidates.push(text[start..end].to_string());
                search_from = end;
            }
            None => break,
        }
        if search_from >= bytes.len() {
            break;
        }
    }

    candidates.sort_by_key(|b| std::cmp::Reverse(b.len()));
    candidates
}

/// Try each candidate (largest first) until one decodes; surface the first
/// candidate's decode error if every candidate fails.
pub(crate) fn decode_first_viable(
    candidates: &[String],
) -> Result<StructuredQuery, ExtractError> {
    let mut first_err = None;
    for candidate in candidates {
        match decode_candidate(candidate) {
            Ok(sq) => return Ok(sq),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    Err(first_err.unwrap_or(ExtractError::NoJsonFound(0)))
}

/// Confidence heuristic: +0.4 for a successful decode, +0.2 for a known
/// `log_source`, +0.2 if any filter field is present, +0.1 per other
/// recognized field up to +0.2, capped at 1.0.
pub(crate) fn score_confidence(sq: &StructuredQuery) -> f32 {
    let mut score = 0.4f32;

    if ALLOWED_LOG_SOURCES.contains(&sq.log_source.as_str()) {
        score += 0.2;
    }

    let has_filter = sq.verb.is_some()
        || sq.resource.is_some()
        || sq.namespace.is_some()
        || sq.user.is_some()
        || sq.auth_decision.is_some();
    if has_filter {
        score += 0.2;
    }

    let other_recognized = [
        sq.timeframe.is_some(),
        sq.time_range.is_some(),
        sq.response_status.is_some(),
        sq.source_ip.is_some(),
        sq.group_by.is_some(),
        sq.subresource.is_some(),
        sq.sort_by.is_some(),
    ]
    .into_iter()
    .filter(|p| *p)
    .count();
    score += (0.1 * other_recognized as f32).min(0.2);

    score.min(1.0)
}

/// Strip a `<output>...</output>`-style wrapper tag some Claude prompts use
/// to delimit structured output, if present.
pub(crate) fn strip_output_tag(text: &str) -> &str {
    const OPEN: &str = "<output>";
    const CLOSE: &str = "</output>";
    if let (Some(open_pos), Some(close_pos)) = (text.find(OPEN), text.rfind(CLOSE)) {
        let inner_start = open_pos + OPEN.len();
        if inner_start <= close_pos {
            return text[inner_start..close_pos].trim();
        }
    }
    text
}

/// Strip a ```json fenced block (or a bare ``` fence), returning the fence
/// body. Grounded on the pack's markdown-fence extractor; returns the last
/// fence found, as later fences are more likely to be the actual answer
/// rather than a worked example earlier in a narrative response.
pub(crate) fn strip_markdown_fence(text: &str) -> Option<String> {
    let mut in_fence = false;
    let mut current = Vec::new();
    let mut last_fence = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_fence && (trimmed.starts_with("```json") || trimmed.starts_with("```JSON") || trimmed == "```")
        {
            in_fence = true;
            current.clear();
            continue;
        }
        if in_fence && trimmed == "```" {
            in_fence = false;
            if !current.is_empty() {
                last_fence = Some(current.join("\n"));
            }
            continue;
        }
        if in_fence {
            current.push(line);
        }
    }
    last_fence
}
