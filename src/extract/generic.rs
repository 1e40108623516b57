//! Generic extractor: direct JSON decode, used when no model-specific
//! handler claims the model id.

use super::{decode_first_viable, find_json_candidates, score_confidence, ExtractError, Extractor};
use crate::model::StructuredQuery;

pub struct GenericExtractor;

impl Extractor for GenericExtractor {
    fn supports_model(&self, _model_id: &str) -> bool {
        true
    }

    fn extract(&self, raw: &str) -> Result<(StructuredQuery, f32), ExtractError> {
        if let Ok(sq) = serde_json::from_str::<StructuredQuery>(raw.trim()) {
            let confidence = score_confidence(&sq);
            return Ok((sq, confidence));
        }

        let candidates = find_json_candidates(raw);
        if candidates.is_empty() {
            return Err(ExtractError::NoJsonFound(raw.len()));
        }

        let sq = decode_first_viable(&candidates)?;
        let confidence = score_confidence(&sq);
        Ok((sq, confidence))
    }
}
