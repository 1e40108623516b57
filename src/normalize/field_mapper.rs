//! `log_source` alias folding, `verb` synonym mapping, `response_status`
//! keyword-to-code mapping.

use super::Normalizer;
use crate::model::{FlexibleScalar, StructuredQuery};

pub struct FieldMapper;

impl Normalizer for FieldMapper {
    fn normalize(&self, sq: &StructuredQuery) -> StructuredQuery {
        let mut out = sq.clone();

        out.log_source = map_log_source_alias(&out.log_source);

        out.verb = out.verb.as_ref().and_then(|v| v.map_trim_nonempty(|s| map_verb(s)));

        out.response_status = out
            .response_status
            .as_ref()
            .and_then(|v| v.map_trim_nonempty(|s| map_response_status(s)));

        out
    }
}

fn map_log_source_alias(raw: &str) -> String {
    let lower = raw.to_lowercase().replace(['_', '-'], "");
    match lower.as_str() {
        "oauthapiserver" | "oauthserver" => "oauth-server".to_string(),
        "openshiftapiserver" => "openshift-apiserver".to_string(),
        "kubeapiserver" => "kube-apiserver".to_string(),
        _ => raw.to_string(),
    }
}

fn map_verb(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "post" => "create".to_string(),
        "read" => "get".to_string(),
        other => other.to_string(),
    }
}

fn map_response_status(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("ok") {
        "200".to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_source_aliases_fold() {
        assert_eq!(map_log_source_alias("OAUTH_API_SERVER"), "oauth-server");
        assert_eq!(map_log_source_alias("oauthserver"), "oauth-server");
        assert_eq!(map_log_source_alias("openshift_api_server"), "openshift-apiserver");
        assert_eq!(map_log_source_alias("kubeapiserver"), "kube-apiserver");
        assert_eq!(map_log_source_alias("node-auditd"), "node-auditd");
    }

    #[test]
    fn verb_synonyms_map_and_others_lowercase() {
        assert_eq!(map_verb("POST"), "create");
        assert_eq!(map_verb("read"), "get");
        assert_eq!(map_verb("PATCH"), "patch");
    }

    #[test]
    fn alias_folding_handles_legacy_log_source_names() {
        let mut sq = StructuredQuery::empty();
        sq.log_source = "OAUTH_API_SERVER".to_string();
        sq.verb = Some(FlexibleScalar::Many(vec![
            "POST".to_string(),
            "read".to_string(),
            "patch".to_string(),
        ]));
        sq.response_status =
            Some(FlexibleScalar::Many(vec!["ok".to_string(), "404".to_string()]));

        let out = FieldMapper.normalize(&sq);
        assert_eq!(out.log_source, "oauth-server");
        assert_eq!(
            out.verb,
            Some(FlexibleScalar::Many(vec![
                "create".to_string(),
                "get".to_string(),
                "patch".to_string()
            ]))
        );
        assert_eq!(
            out.response_status,
            Some(FlexibleScalar::Many(vec!["200".to_string(), "404".to_string()]))
        );
    }
}
