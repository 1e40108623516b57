//! Ollama/local-model extractor: tolerant of fenced code blocks and
//! multi-paragraph narrative prefixes.

use super::{
    decode_first_viable, find_json_candidates, score_confidence, strip_markdown_fence,
    ExtractError, Extractor,
};
use crate::model::StructuredQuery;

pub struct OllamaExtractor;

impl Extractor for OllamaExtractor {
    fn supports_model(&self, model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        id.contains("llama") || id.contains("ollama") || id.contains("mistral") || id.contains("qwen")
    }

    fn extract(&self, raw: &str) -> Result<(StructuredQuery, f32), ExtractError> {
        if let Some(fence_body) = strip_markdown_fence(raw) {
            if let Ok(sq) = decode_first_viable(&find_json_candidates(&fence_body)) {
                let confidence = score_confidence(&sq);
                return Ok((sq, confidence));
            }
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
    fn supports_llama_model_ids() {
        let e = OllamaExtractor;
        assert!(e.supports_model("llama3.1:8b"));
        assert!(!e.supports_model("gpt-4o"));
    }

    #[test]
    fn extracts_from_fenced_narrative_block() {
        let e = OllamaExtractor;
        let raw = "Here is the structured query:\n\n```json\n{\n  \"log_source\": \"kube-apiserver\",\n  \"verb\": \"get\",\n  \"resource\": \"pods\",\n  \"limit\": 20\n}\n```";
        let (sq, confidence) = e.extract(raw).unwrap();
        assert_eq!(sq.log_source, "kube-apiserver");
        assert_eq!(sq.limit, 20);
        assert!(confidence >= 0.8);
    }
}
