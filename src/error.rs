//! Shared error taxonomy.
//!
//! A single closed set of diagnostic codes used by the Validator and the
//! Rule Engine alike. Extractor-local failures (`NO_JSON_FOUND`,
//! `DECODE_ERROR`, `UNSUPPORTED_MODEL`) live in the same enum so any
//! diagnostic surfaced to a caller carries a code from one closed set.

use serde::{Deserialize, Serialize};

/// Closed taxonomy of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FieldRequired,
    FieldEnum,
    FieldRange,
    FieldFormat,
    FieldConflict,
    FieldDependency,
    PerformanceWarning,
    InternalError,
    NoJsonFound,
    DecodeError,
    UnsupportedModel,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FieldRequired => "FIELD_REQUIRED",
            Self::FieldEnum => "FIELD_ENUM",
            Self::FieldRange => "FIELD_RANGE",
            Self::FieldFormat => "FIELD_FORMAT",
            Self::FieldConflict => "FIELD_CONFLICT",
            Self::FieldDependency => "FIELD_DEPENDENCY",
            Self::PerformanceWarning => "PERFORMANCE_WARNING",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NoJsonFound => "NO_JSON_FOUND",
            Self::DecodeError => "DECODE_ERROR",
            Self::UnsupportedModel => "UNSUPPORTED_MODEL",
        };
        f.write_str(s)
    }
}
