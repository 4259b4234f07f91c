//! Pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Build file or in-memory connection pools.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON` and a busy timeout.
//! - Returned pools point at a fully migrated schema.
//! - In-memory pools hold exactly one connection, because every in-memory
//!   SQLite connection is its own database.

use super::migrations::apply_migrations;
use super::{DbError, DbPool, DbResult};
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Default number of pooled connections for file databases.
pub const DEFAULT_POOL_SIZE: u32 = 8;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a pooled SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the database file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, max_size: u32) -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(configure_connection);
    build_pool(manager, max_size.max(1), "file")
}

/// Opens a single-connection in-memory pool and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    build_pool(manager, 1, "memory")
}

fn build_pool(manager: SqliteConnectionManager, max_size: u32, mode: &str) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode} pool_size={max_size}");

    match Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(DbError::from)
        .and_then(|pool| migrate_pool(&pool).map(|()| pool))
    {
        Ok(pool) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn migrate_pool(pool: &DbPool) -> DbResult<()> {
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)
}

fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}
