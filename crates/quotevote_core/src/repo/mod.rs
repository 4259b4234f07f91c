//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for quotes and ballots.
//! - Isolate SQLite query details from coordinator orchestration.
//! - Translate storage constraint violations into semantic errors.
//!
//! # Invariants
//! - Crate-private: only `QuoteBoard` mutates tallies and ballots.
//! - Repositories borrow a `Connection`, so one transaction can span both.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateText`,
//!   `DuplicateBallot`) in addition to DB transport errors.

use crate::db::DbError;
use crate::model::ballot::VoterIdentity;
use crate::model::quote::QuoteId;
use crate::model::validation::ValidationError;
use rusqlite::ffi;
use thiserror::Error;

pub mod quote_repo;
pub mod vote_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for quote and ballot persistence.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("quote not found: {0}")]
    NotFound(QuoteId),
    #[error("a quote with identical text already exists")]
    DuplicateText,
    #[error("voter `{voter}` already has a ballot for quote {quote_id}")]
    DuplicateBallot {
        quote_id: QuoteId,
        voter: VoterIdentity,
    },
    #[error("quote {0} still has ballots referencing it")]
    BallotsRemain(QuoteId),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(failure.extended_code)
        }
        _ => None,
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
