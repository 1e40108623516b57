//! Claude-family extractor: clean JSON or JSON wrapped in `<output>` tags.

use super::{
    decode_first_viable, find_json_candidates, score_confidence, strip_output_tag, ExtractError,
    Extractor,
};
use crate::model::StructuredQuery;

pub struct ClaudeExtractor;

impl Extractor for ClaudeExtractor {
    fn supports_model(&self, model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        id.contains("claude") || id.contains("anthropic")
    }

    fn extract(&self, raw: &str) -> Result<(StructuredQuery, f32), ExtractError> {
        if let Ok(sq) = serde_json::from_str::<StructuredQuery>(raw.trim()) {
            let confidence = score_confidence(&sq);
            return Ok((sq, confidence));
        }

        let unwrapped = strip_output_tag(raw);
        let candidates = find_json_candidates(unwrapped);
        if candidates.is_empty() {
            return Err(ExtractError::NoJsonFound(raw.len()));
        }

        let sq = decode_first_viable(&candidates)?;
        let confidence = score_confidence(&sq);
        Ok((sq, confidence))
    }
}
