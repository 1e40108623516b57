//! Default fills, flexible-scalar trimming, timeframe keyword folding, and
//! time-range repair.

use chrono::Duration;

use super::Normalizer;
use crate::model::{FlexibleScalar, StructuredQuery, ALLOWED_LOG_SOURCES, DEFAULT_LOG_SOURCE};

pub struct JsonNormalizer;

impl Normalizer for JsonNormalizer {
    fn normalize(&self, sq: &StructuredQuery) -> StructuredQuery {
        let mut out = sq.clone();

        let trimmed_source = out.log_source.trim();
        out.log_source = if trimmed_source.is_empty() {
            DEFAULT_LOG_SOURCE.to_string()
        } else {
            trimmed_source.to_string()
        };

        if out.limit <= 0 {
            out.limit = 20;
        } else if out.limit > 1000 {
            out.limit = 1000;
        }

        out.verb = normalize_flexible(&out.verb);
        out.resource = normalize_flexible(&out.resource);
        out.namespace = normalize_flexible(&out.namespace);
        out.user = normalize_flexible(&out.user);
        out.response_status = normalize_flexible(&out.response_status);
        out.source_ip = normalize_flexible(&out.source_ip);
        out.group_by = normalize_flexible(&out.group_by);

        out.exclude_users = normalize_list(&out.exclude_users);
        out.exclude_resources = normalize_list(&out.exclude_resources);

        out.timeframe = out.timeframe.as_deref().map(fold_timeframe_keyword);

        if let Some(range) = &out.time_range {
            let mut start = range.start;
            let mut end = range.end;
            if start > end {
                std::mem::swap(&mut start, &mut end);
            } else if start == end {
                end = start + Duration::hours(1);
            }
            out.time_range = Some(crate::model::TimeRange { start, end });
        }

        out
    }
}

fn normalize_flexible(value: &Option<FlexibleScalar>) -> Option<FlexibleScalar> {
    value.as_ref().and_then(|v| v.map_trim_nonempty(|s| s.to_string()))
}

fn normalize_list(value: &Option<Vec<String>>) -> Option<Vec<String>> {
    value.as_ref().and_then(|items| {
        let cleaned: Vec<String> = items
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    })
}

/// Fold timeframe keyword variants, case-insensitive and
/// whitespace-trimmed. `recent`/`default`/empty are left unchanged — they
/// are reserved but not yet wired to any filter, so normalization passes
/// them through and leaves acceptance to the validator.
fn fold_timeframe_keyword(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    match lower.as_str() {
        "1h" | "1_hour" | "1-hour" | "hour" | "last_hour" => "1_hour_ago".to_string(),
        "today" | "current_day" => "today".to_string(),
        "yesterday" | "prev_day" => "yesterday".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Exposed for the validator/config default: the set of sources the
/// normalizer will ever default into when `log_source` is blank.
pub fn default_log_source_is_allowed() -> bool {
    ALLOWED_LOG_SOURCES.contains(&DEFAULT_LOG_SOURCE)
}
