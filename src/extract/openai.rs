//! OpenAI-family extractor: clean JSON, tolerant of leading/trailing prose.

use super::{
    decode_first_viable, find_json_candidates, score_confidence, ExtractError, Extractor,
};
use crate::model::StructuredQuery;

pub struct OpenAiExtractor;

impl Extractor for OpenAiExtractor {
    fn supports_model(&self, model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        id.contains("gpt") || id.contains("openai") || id.contains("o1") || id.contains("o3")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_gpt_model_ids() {
        let e = OpenAiExtractor;
        assert!(e.supports_model("gpt-4o-mini"));
        assert!(!e.supports_model("claude-3-opus"));
    }

    #[test]
    fn tolerates_surrounding_prose() {
        let e = OpenAiExtractor;
        let raw = r#"Sure, here is the query: {"log_source":"kube-apiserver","limit":20} let me know if you need anything else."#;
        let (sq, _) = e.extract(raw).unwrap();
        assert_eq!(sq.log_source, "kube-apiserver");
    }
}
