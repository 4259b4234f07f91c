//! Caller-facing input validation errors.

use thiserror::Error;

/// Malformed input rejected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quote text is empty or whitespace only.
    #[error("quote text cannot be blank")]
    EmptyText,
    /// A tag at `position` is empty or whitespace only.
    #[error("tag at position {position} cannot be blank")]
    BlankTag { position: usize },
    /// Pagination input could not be parsed as an integer.
    #[error("`{field}` must be a positive integer, got `{value}`")]
    NotNumeric { field: &'static str, value: String },
    /// Pagination input parsed but is zero or negative.
    #[error("`{field}` must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },
    /// Pagination input is a positive integer beyond the supported range.
    #[error("`{field}` must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: u32,
    },
}
