//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Build pooled SQLite connections for the quote board.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Every pooled connection has `foreign_keys=ON` before first use.
//! - No quote or ballot data is read or written before migrations succeed.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_pool, open_pool_in_memory, DEFAULT_POOL_SIZE};

/// Shared pool handle injected into the coordinator.
pub type DbPool = Pool<SqliteConnectionManager>;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool failure: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
