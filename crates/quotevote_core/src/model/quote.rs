//! Quote domain model.
//!
//! # Responsibility
//! - Define the persisted quote record and its creation request.
//! - Normalize optional fields before persistence.
//!
//! # Invariants
//! - `text` is never blank and is unique across all quotes (enforced by storage).
//! - `tags` keeps caller order; it may be empty but never holds blank entries.
//! - `vote_count` starts at 0 and only changes through a recorded ballot.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by storage at creation. Never reused.
pub type QuoteId = i64;

/// Persisted quote with its cached vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    /// Always equal to the number of ballots referencing this quote.
    pub vote_count: u64,
}

/// Creation request for a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewQuote {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewQuote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
            tags: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and normalizes the request.
    ///
    /// - `text` is kept verbatim, so uniqueness compares exactly what was
    ///   submitted; only a blank text is rejected.
    /// - `author` is trimmed; a blank author becomes `None`.
    /// - Every tag is trimmed and must be non-blank. Order is preserved.
    pub fn validate(&self) -> Result<NewQuote, ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let author = self
            .author
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let mut tags = Vec::with_capacity(self.tags.len());
        for (position, tag) in self.tags.iter().enumerate() {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::BlankTag { position });
            }
            tags.push(trimmed.to_string());
        }

        Ok(NewQuote {
            text: self.text.clone(),
            author,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewQuote, Quote};
    use crate::model::validation::ValidationError;

    #[test]
    fn validate_rejects_blank_text() {
        let err = NewQuote::new("   \n").validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyText);
    }

    #[test]
    fn validate_trims_author_and_tags_but_keeps_order() {
        let request = NewQuote::new("Stay hungry")
            .with_author("  ")
            .with_tags([" life ", "Work", "art"]);
        let normalized = request.validate().unwrap();
        assert_eq!(normalized.author, None);
        assert_eq!(normalized.tags, vec!["life", "Work", "art"]);
        assert_eq!(normalized.text, "Stay hungry");
    }

    #[test]
    fn validate_reports_blank_tag_position() {
        let err = NewQuote::new("x")
            .with_tags(["ok", " "])
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::BlankTag { position: 1 });
    }

    #[test]
    fn quote_serializes_vote_count_in_camel_case() {
        let quote = Quote {
            id: 7,
            text: "t".to_string(),
            author: None,
            tags: vec![],
            vote_count: 3,
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["voteCount"], 3);
        assert!(json["author"].is_null());
    }
}
