//! Phase 3 — Advanced Fields.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{PhaseOutcome, ValidatorConfig};
use crate::error::ErrorCode;
use crate::model::{Severity, StructuredQuery, ValidationError, ALLOWED_AUTH_DECISIONS};

static NESTED_QUANTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*[+*][^()]*\)[+*]").unwrap());

/// Known IANA zones accepted for `business_hours.timezone`. The pack
/// carries no timezone-database crate, so this is a conservative
/// allowlist rather than full IANA resolution.
const KNOWN_IANA_ZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Berlin",
    "Europe/Paris",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Kolkata",
    "Australia/Sydney",
];

pub(super) fn check(sq: &StructuredQuery, config: &ValidatorConfig) -> PhaseOutcome {
    let mut warnings = Vec::new();

    macro_rules! fail {
        ($code:expr, $field:expr, $($rest:tt)*) => {
            return PhaseOutcome {
                error: Some(ValidationError::new($code, $field, Severity::Error) $($rest)*),
                warnings,
            }
        };
    }

    for (field, pattern) in [
        ("user_pattern", &sq.user_pattern),
        ("namespace_pattern", &sq.namespace_pattern),
        ("resource_name_pattern", &sq.resource_name_pattern),
        ("request_uri_pattern", &sq.request_uri_pattern),
    ] {
        let Some(pattern) = pattern else { continue };

        if Regex::new(pattern).is_err() {
            fail!(
                ErrorCode::FieldFormat,
                field,
                .with_expected("a compilable regular expression").with_actual(pattern.clone())
            );
        }

        if is_catastrophic(pattern) {
            fail!(
                ErrorCode::FieldFormat,
                field,
                .with_suggestion("avoid nested unbounded quantifiers such as (.+)+ or (a+)+")
                    .with_actual(pattern.clone())
            );
        }

        if pattern_complexity_score(pattern) > 100 {
            warnings.push(
                ValidationError::new(ErrorCode::PerformanceWarning, field, Severity::Warning)
                    .with_suggestion("this pattern is long or has many quantifiers/groups; expect slower matching"),
            );
        }
    }

    if let Some(response_status) = &sq.response_status {
        for status in response_status.as_slice() {
            if !is_valid_response_status(status) {
                fail!(
                    ErrorCode::FieldFormat,
                    "response_status",
                    .with_expected("100-599 or a comparison expression like >=N")
                        .with_actual(status.clone())
                );
            }
        }
    }

    if let Some(auth_decision) = &sq.auth_decision {
        if !ALLOWED_AUTH_DECISIONS.contains(&auth_decision.as_str()) {
            fail!(
                ErrorCode::FieldEnum,
                "auth_decision",
                .with_expected(config.allowed_auth_decisions.join(", "))
                    .with_actual(auth_decision.clone())
            );
        }
    }

    if let Some(exclude_users) = &sq.exclude_users {
        if exclude_users.len() > 50 {
            fail!(
                ErrorCode::FieldRange,
                "exclude_users",
                .with_expected("sequence length <= 50").with_actual(exclude_users.len().to_string())
            );
        }
        if exclude_users.iter().any(|u| u.trim().is_empty()) {
            fail!(ErrorCode::FieldFormat, "exclude_users", .with_suggestion("remove empty entries"));
        }
    }

    if let Some(time_range) = &sq.time_range {
        let duration = time_range.end - time_range.start;
        if duration > chrono::Duration::days(90) {
            fail!(
                ErrorCode::FieldRange,
                "time_range",
                .with_expected("duration <= 90 days").with_actual(format!("{} days", duration.num_days()))
            );
        }
    }

    if let Some(business_hours) = &sq.business_hours {
        if !(0..=23).contains(&business_hours.start_hour) || !(0..=23).contains(&business_hours.end_hour) {
            fail!(
                ErrorCode::FieldRange,
                "business_hours",
                .with_expected("start_hour and end_hour in 0..=23")
            );
        }
        if let Some(timezone) = &business_hours.timezone {
            if !KNOWN_IANA_ZONES.contains(&timezone.as_str()) {
                fail!(
                    ErrorCode::FieldFormat,
                    "business_hours.timezone",
                    .with_expected("a known IANA timezone").with_actual(timezone.clone())
                );
            }
        }
    }

    PhaseOutcome { error: None, warnings }
}

fn is_catastrophic(pattern: &str) -> bool {
    NESTED_QUANTIFIER.is_match(pattern) || has_duplicate_alternation(pattern)
}

/// `(a|a)*`-shaped patterns: a group with two identical alternation
/// branches, itself quantified.
fn has_duplicate_alternation(pattern: &str) -> bool {
    let bytes: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '(' {
            if let Some(close) = matching_paren(&bytes, i) {
                let inner: String = bytes[i + 1..close].iter().collect();
                let followed_by_quantifier =
                    bytes.get(close + 1).is_some_and(|c| *c == '+' || *c == '*');
                if followed_by_quantifier && inner.contains('|') {
                    let branches: Vec<&str> = inner.split('|').collect();
                    if branches.iter().any(|b| branches.iter().filter(|o| **o == *b).count() > 1) {
                        return true;
                    }
                }
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
    false
}

fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    for (offset, ch) in chars[open..].iter().enumerate() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Length plus count of grouping/quantifier metacharacters.
fn pattern_complexity_score(pattern: &str) -> usize {
    let metachar_count = pattern.chars().filter(|c| "()+*?{}".contains(*c)).count();
    pattern.len() + metachar_count
}

fn is_valid_response_status(status: &str) -> bool {
    let s = status.trim();
    if let Some(rest) = s
        .strip_prefix(">=")
        .or_else(|| s.strip_prefix("<="))
        .or_else(|| s.strip_prefix('>'))
        .or_else(|| s.strip_prefix('<'))
    {
        return rest.parse::<u32>().is_ok_and(|n| (100..=599).contains(&n));
    }
    s.parse::<u32>().is_ok_and(|n| (100..=599).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catastrophic_nested_quantifier_is_rejected() {
        let mut sq = StructuredQuery::empty();
        sq.user_pattern = Some("(a+)+".to_string());
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldFormat);
    }

    #[test]
    fn uncompilable_regex_is_rejected() {
        let mut sq = StructuredQuery::empty();
        sq.namespace_pattern = Some("(unterminated".to_string());
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldFormat);
    }

    #[test]
    fn comparison_expression_response_status_is_valid() {
        let mut sq = StructuredQuery::empty();
        sq.response_status = Some(">=500".into());
        assert!(check(&sq, &ValidatorConfig::default()).error.is_none());
    }

    #[test]
    fn time_range_over_90_days_fails() {
        use crate::model::TimeRange;
        let mut sq = StructuredQuery::empty();
        let start = chrono::Utc::now();
        sq.time_range = Some(TimeRange { start, end: start + chrono::Duration::days(100) });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldRange);
    }

    #[test]
    fn unknown_timezone_fails() {
        use crate::model::BusinessHours;
        let mut sq = StructuredQuery::empty();
        sq.business_hours = Some(BusinessHours {
            start_hour: 9,
            end_hour: 17,
            outside_only: None,
            timezone: Some("Mars/Colony_One".to_string()),
        });
        let outcome = check(&sq, &ValidatorConfig::default());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::FieldFormat);
    }
}
