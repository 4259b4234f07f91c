//! Tally audit records.

use super::quote::QuoteId;
use serde::Serialize;

/// A quote whose cached `vote_count` disagrees with its ballot rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyMismatch {
    pub quote_id: QuoteId,
    pub vote_count: i64,
    pub ballots: i64,
}
