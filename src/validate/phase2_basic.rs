//! Phase 2 — Basic Fields.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{FlexibleScalar, Severity, StructuredQuery, ValidationError};

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());
static BASIC_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub(super) fn check(sq: &StructuredQuery, config: &ValidatorConfig) -> PhaseOutcome {
    macro_rules! fail {
        ($code:expr, $field:expr, $($rest:tt)*) => {
            return PhaseOutcome {
                error: Some(ValidationError::new($code, $field, Severity::Error) $($rest)*),
                warnings: Vec::new(),
            }
        };
    }

    if sq.limit < 0 || sq.limit > 1000 {
        fail!(
            ErrorCode::FieldRange,
            "limit",
            .with_expected("0..=1000")
                .with_actual(sq.limit.to_string())
        );
    }

    if let Some(verb) = &sq.verb {
        if let Some(e) = check_verb(verb, config) {
            return PhaseOutcome { error: Some(e), warnings: Vec::new() };
        }
    }

    if let Some(namespace) = &sq.namespace {
        for ns in namespace.as_slice() {
            if ns.len() > 63 || ns.is_empty() || !DNS_LABEL.is_match(ns) {
                fail!(
                    ErrorCode::FieldFormat,
                    "namespace",
                    .with_expected("DNS label: ^[a-z0-9]([-a-z0-9]*[a-z0-9])?$, length 1-63")
                        .with_actual(ns.clone())
                );
            }
        }
    }

    if let Some(user) = &sq.user {
        for u in user.as_slice() {
            if u.is_empty() || u.len() > 256 {
                fail!(
                    ErrorCode::FieldRange,
                    "user",
                    .with_expected("length 1..=256").with_actual(u.clone())
                );
            }
            if u.contains('@') && !BASIC_EMAIL.is_match(u) {
                fail!(
                    ErrorCode::FieldFormat,
                    "user",
                    .with_expected("basic email shape").with_actual(u.clone())
                );
            }
        }
    }

    if let Some(timeframe) = &sq.timeframe {
        if !timeframe.is_empty() && !config.allowed_timeframes.iter().any(|t| t == timeframe) {
            fail!(
                ErrorCode::FieldEnum,
                "timeframe",
                .with_expected(config.allowed_timeframes.join(", "))
                    .with_actual(timeframe.clone())
            );
        }
    }

    if let Some(source_ip) = &sq.source_ip {
        for ip in source_ip.as_slice() {
            if ip.parse::<std::net::IpAddr>().is_err() && ip.parse::<ipnetwork::IpNetwork>().is_err() {
                fail!(
                    ErrorCode::FieldFormat,
                    "source_ip",
                    .with_expected("valid IPv4/IPv6 address or CIDR").with_actual(ip.clone())
                );
            }
        }
    }

    PhaseOutcome::ok()
}

fn check_verb(verb: &FlexibleScalar, config: &ValidatorConfig) -> Option<ValidationError> {
    let items = verb.as_slice();
    if items.len() > 10 {
        return Some(
            ValidationError::new(ErrorCode::FieldRange, "verb", Severity::Error)
                .with_expected("sequence length <= 10")
                .with_actual(items.len().to_string()),
        );
    }
    if verb.contains_duplicates() {
        return Some(
            ValidationError::new(ErrorCode::FieldConflict, "verb", Severity::Error)
                .with_suggestion("remove duplicate verb entries"),
        );
    }
    for v in items {
        if !config.allowed_verbs.iter().any(|allowed| allowed.eq_ignore_ascii_case(v)) {
            return Some(
                ValidationError::new(ErrorCode::FieldEnum, "verb", Severity::Error)
                    .with_expected(config.allowed_verbs.join(", "))
                    .with_actual(v.clone()),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_out_of_range_fails() {
        let mut sq = StructuredQuery::empty();
        sq.log_source = "kube-apiserver".to_string();
        sq.limit = 2000;
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldRange);
    }

    #[test]
    fn invalid_namespace_dns_label_fails() {
        let mut sq = StructuredQuery::empty();
        sq.namespace = Some("Not_Valid".into());
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldFormat);
    }

    #[test]
    fn malformed_email_user_fails() {
        let mut sq = StructuredQuery::empty();
        sq.user = Some("not-an-email@".into());
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldFormat);
    }

    #[test]
    fn valid_cidr_source_ip_passes() {
        let mut sq = StructuredQuery::empty();
        sq.source_ip = Some("10.0.0.0/8".into());
        assert!(check(&sq, &ValidatorConfig::default()).error.is_none());
    }

    #[test]
    fn duplicate_verbs_conflict() {
        let mut sq = StructuredQuery::empty();
        sq.verb = Some(FlexibleScalar::Many(vec!["get".to_string(), "get".to_string()]));
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldConflict);
    }
}
