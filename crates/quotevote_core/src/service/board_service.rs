//! Ranking/voting coordinator.
//!
//! # Responsibility
//! - Provide quote submission, removal, ranked listing and vote casting.
//! - Run every write as one `BEGIN IMMEDIATE` transaction spanning the quote
//!   store and the vote ledger.
//! - Translate repository errors into caller-facing `BoardError` values.
//!
//! # Invariants
//! - `vote_count` of every quote equals the number of its ballots.
//! - At most one ballot exists per `(quote, voter)`; the unique index on
//!   `votes` is the final guard and surfaces as `BoardError::AlreadyVoted`.
//! - A failed operation leaves no partial writes (the transaction rolls back
//!   on drop).
//! - Quote text and voter identities never appear in log lines.

use crate::config::BoardConfig;
use crate::db::{open_pool, open_pool_in_memory, DbError, DbPool};
use crate::model::ballot::VoterIdentity;
use crate::model::page::{PageRequest, QuotePage};
use crate::model::quote::{NewQuote, Quote, QuoteId};
use crate::model::validation::ValidationError;
use crate::repo::quote_repo::{QuoteRepository, SqliteQuoteRepository};
use crate::model::tally::TallyMismatch;
use crate::repo::vote_repo::{SqliteVoteLedger, VoteLedger};
use crate::repo::RepoError;
use log::{error, info};
use rusqlite::{Transaction, TransactionBehavior};
use std::time::Instant;
use thiserror::Error;

pub type BoardResult<T> = Result<T, BoardError>;

/// Caller-facing failure of a board operation.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("quote not found: {0}")]
    NotFound(QuoteId),
    #[error("a quote with identical text already exists")]
    DuplicateText,
    #[error("you have already voted for quote {quote_id}")]
    AlreadyVoted {
        quote_id: QuoteId,
        voter: VoterIdentity,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Unexpected substrate failure (I/O, pool exhaustion, corrupt rows).
    #[error("storage failure")]
    Storage(#[source] StorageError),
}

/// Opaque substrate failure carried by [`BoardError::Storage`].
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StorageError(RepoError);

/// Coarse classification of [`BoardError`] for request layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateText,
    AlreadyVoted,
    Validation,
    Storage,
}

impl ErrorKind {
    /// HTTP-style status hint.
    pub fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::DuplicateText => 409,
            Self::AlreadyVoted => 403,
            Self::Validation => 400,
            Self::Storage => 500,
        }
    }

    /// Stable machine-readable code used in logs.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateText => "duplicate_text",
            Self::AlreadyVoted => "already_voted",
            Self::Validation => "validation",
            Self::Storage => "storage",
        }
    }
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateText => ErrorKind::DuplicateText,
            Self::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<RepoError> for BoardError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateText => Self::DuplicateText,
            RepoError::DuplicateBallot { quote_id, voter } => Self::AlreadyVoted { quote_id, voter },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(StorageError(other)),
        }
    }
}

impl From<DbError> for BoardError {
    fn from(value: DbError) -> Self {
        Self::Storage(StorageError(RepoError::Db(value)))
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError(RepoError::from(value)))
    }
}

impl From<r2d2::Error> for BoardError {
    fn from(value: r2d2::Error) -> Self {
        Self::Storage(StorageError(RepoError::from(value)))
    }
}

/// Coordinator over the quote store and vote ledger.
///
/// Cloning is cheap and clones share the same pool, so one board can be
/// handed to every request handler or worker thread.
#[derive(Clone)]
pub struct QuoteBoard {
    pool: DbPool,
}

impl QuoteBoard {
    /// Wraps an already-migrated pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Opens the file database named by `config`, or an in-memory one.
    pub fn open(config: &BoardConfig) -> BoardResult<Self> {
        let pool = match config.db_path.as_ref() {
            Some(path) => open_pool(path, config.pool_size)?,
            None => open_pool_in_memory()?,
        };
        Ok(Self::new(pool))
    }

    pub fn open_in_memory() -> BoardResult<Self> {
        Ok(Self::new(open_pool_in_memory()?))
    }

    /// Validates and stores a new quote with `vote_count = 0`.
    ///
    /// # Errors
    /// - `Validation` for blank text or blank tags.
    /// - `DuplicateText` when another quote has exactly the same text.
    pub fn submit_quote(&self, request: &NewQuote) -> BoardResult<Quote> {
        let started_at = Instant::now();
        let result = request.validate().map_err(BoardError::from).and_then(|quote| {
            self.write(|tx| Ok(SqliteQuoteRepository::new(tx).create_quote(&quote)?))
        });
        log_outcome("quote_submit", started_at, result.as_ref().map(|quote| quote.id));
        result
    }

    /// Deletes a quote and all of its ballots as one unit.
    ///
    /// Returns the quote as it was immediately before deletion.
    pub fn remove_quote(&self, quote_id: QuoteId) -> BoardResult<Quote> {
        let started_at = Instant::now();
        let result = self.write(|tx| {
            let quotes = SqliteQuoteRepository::new(tx);
            let ledger = SqliteVoteLedger::new(tx);

            let quote = quotes
                .get_quote(quote_id)?
                .ok_or(BoardError::NotFound(quote_id))?;
            let removed = ledger.delete_all_for_quote(quote_id)?;
            quotes.delete_quote(quote_id)?;
            Ok((quote, removed))
        });

        if let Ok((_, removed)) = &result {
            info!("event=ballots_cascade module=service quote_id={quote_id} removed={removed}");
        }
        let result = result.map(|(quote, _)| quote);
        log_outcome("quote_remove", started_at, result.as_ref().map(|_| quote_id));
        result
    }

    /// Returns one page of quotes ranked by `vote_count DESC, id ASC`.
    ///
    /// Pages past the end are empty but still carry the correct `total`.
    pub fn list_quotes(&self, request: PageRequest) -> BoardResult<QuotePage> {
        let mut conn = self.pool.get()?;
        // Deferred read transaction: count and rows come from one snapshot.
        let tx = conn.transaction()?;
        let (items, total) = SqliteQuoteRepository::new(&tx).list_ranked(&request)?;
        tx.commit()?;

        Ok(QuotePage {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
        })
    }

    /// Same as [`Self::list_quotes`] for raw query-string input.
    pub fn list_quotes_from_query(
        &self,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> BoardResult<QuotePage> {
        let request = PageRequest::from_query(page, page_size)?;
        self.list_quotes(request)
    }

    pub fn get_quote(&self, quote_id: QuoteId) -> BoardResult<Quote> {
        let conn = self.pool.get()?;
        SqliteQuoteRepository::new(&conn)
            .get_quote(quote_id)?
            .ok_or(BoardError::NotFound(quote_id))
    }

    pub fn has_voted(&self, quote_id: QuoteId, voter: &VoterIdentity) -> BoardResult<bool> {
        let conn = self.pool.get()?;
        Ok(SqliteVoteLedger::new(&conn).has_voted(quote_id, voter)?)
    }

    /// Number of ballots recorded for `quote_id`; 0 for unknown quotes.
    pub fn ballot_count(&self, quote_id: QuoteId) -> BoardResult<u64> {
        let conn = self.pool.get()?;
        Ok(SqliteVoteLedger::new(&conn).count_for_quote(quote_id)?)
    }

    /// Records one ballot for `voter` and bumps the quote's tally.
    ///
    /// The ballot insert and the increment commit together or not at all.
    ///
    /// # Errors
    /// - `NotFound` when the quote does not exist.
    /// - `AlreadyVoted` when `voter` already has a ballot for this quote.
    pub fn cast_vote(&self, quote_id: QuoteId, voter: &VoterIdentity) -> BoardResult<Quote> {
        let started_at = Instant::now();
        let result = self.write(|tx| {
            let quotes = SqliteQuoteRepository::new(tx);
            let ledger = SqliteVoteLedger::new(tx);

            if quotes.get_quote(quote_id)?.is_none() {
                return Err(BoardError::NotFound(quote_id));
            }
            if ledger.has_voted(quote_id, voter)? {
                return Err(BoardError::AlreadyVoted {
                    quote_id,
                    voter: voter.clone(),
                });
            }

            ledger.record_vote(quote_id, voter)?;
            Ok(quotes.increment_vote_count(quote_id)?)
        });
        log_outcome("vote_cast", started_at, result.as_ref().map(|_| quote_id));
        result
    }

    /// Reports every quote whose cached tally differs from its ballot count.
    pub fn audit_tallies(&self) -> BoardResult<Vec<TallyMismatch>> {
        let conn = self.pool.get()?;
        let mismatches = SqliteVoteLedger::new(&conn).tally_mismatches()?;
        if mismatches.is_empty() {
            info!("event=tally_audit module=service status=ok");
        } else {
            error!(
                "event=tally_audit module=service status=error mismatches={}",
                mismatches.len()
            );
        }
        Ok(mismatches)
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> BoardResult<T>,
    ) -> BoardResult<T> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn log_outcome(event: &str, started_at: Instant, outcome: Result<QuoteId, &BoardError>) {
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(quote_id) => info!(
            "event={event} module=service status=ok quote_id={quote_id} duration_ms={duration_ms}"
        ),
        Err(err) if err.kind() == ErrorKind::Storage => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={}",
            err.kind().code(),
            error_chain(err)
        ),
        Err(err) => info!(
            "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
            err.kind().code()
        ),
    }
}

/// Renders `err` and its sources as `outer: inner: ...`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::{error_chain, BoardError, ErrorKind};
    use crate::model::validation::ValidationError;

    #[test]
    fn storage_errors_keep_their_cause_in_the_chain() {
        let err = BoardError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.to_string(), "storage failure");

        let rendered = error_chain(&err);
        assert!(rendered.starts_with("storage failure: "));
        assert!(rendered.contains("Query returned no rows"));
    }

    #[test]
    fn domain_errors_render_without_extra_causes() {
        let err = BoardError::from(ValidationError::EmptyText);
        assert_eq!(error_chain(&err), "quote text cannot be blank");
        assert_eq!(err.kind().status(), 400);
    }
}
