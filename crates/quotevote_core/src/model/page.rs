//! Pagination request and ranked page envelope.
//!
//! # Invariants
//! - `page` and `page_size` are always >= 1 once a `PageRequest` exists.
//! - Invalid caller input is rejected, never clamped.

use super::quote::Quote;
use super::validation::ValidationError;
use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Validated 1-based pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a request from numeric input, rejecting values below 1.
    pub fn new(page: i64, page_size: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            page: positive("page", page)?,
            page_size: positive("pageSize", page_size)?,
        })
    }

    /// Coerces raw query-string values. Absent or blank values take defaults.
    pub fn from_query(
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let page = parse_field("page", page, DEFAULT_PAGE)?;
        let page_size = parse_field("pageSize", page_size, DEFAULT_PAGE_SIZE)?;
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of ranked rows preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    if value < 1 {
        return Err(ValidationError::NotPositive { field, value });
    }
    u32::try_from(value).map_err(|_| ValidationError::TooLarge {
        field,
        value,
        max: u32::MAX,
    })
}

fn parse_field(
    field: &'static str,
    raw: Option<&str>,
    default: u32,
) -> Result<u32, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        })?;
    positive(field, value)
}

/// One page of the ranked listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePage {
    /// Ordered by `vote_count DESC, id ASC`.
    pub items: Vec<Quote>,
    /// Number of quotes across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::{PageRequest, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
    use crate::model::validation::ValidationError;

    #[test]
    fn absent_and_blank_values_use_defaults() {
        let request = PageRequest::from_query(None, Some("  ")).unwrap();
        assert_eq!(request.page(), DEFAULT_PAGE);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = PageRequest::from_query(Some("two"), None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotNumeric {
                field: "page",
                value: "two".to_string()
            }
        );
    }

    #[test]
    fn non_positive_values_are_rejected_not_clamped() {
        let err = PageRequest::from_query(Some("1"), Some("0")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotPositive {
                field: "pageSize",
                value: 0
            }
        );
        assert!(PageRequest::new(-3, 10).is_err());
    }

    #[test]
    fn values_beyond_u32_are_too_large_not_non_numeric() {
        let err = PageRequest::from_query(Some("4294967296"), None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                field: "page",
                value: 4_294_967_296,
                max: u32::MAX
            }
        );
        assert!(matches!(
            PageRequest::new(1, i64::MAX),
            Err(ValidationError::TooLarge {
                field: "pageSize",
                ..
            })
        ));
    }

    #[test]
    fn offset_accounts_for_page_size() {
        let request = PageRequest::new(3, 25).unwrap();
        assert_eq!(request.offset(), 50);
    }
}
