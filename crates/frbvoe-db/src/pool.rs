//! Connection pool creation.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

/// SQLite busy timeout applied to every pooled connection, milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    Init(#[from] r2d2::Error),
}

/// Creates a SQLite connection pool for the given database path.
///
/// Every connection is initialised with WAL journaling, foreign keys, and
/// a busy timeout so concurrent request handlers queue instead of failing.
/// Pass `:memory:` for an in-memory database (tests).
///
/// # Errors
///
/// Returns `PoolError::Init` if the pool cannot be built.
pub fn create_pool(db_path: &str) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
    });

    Ok(Pool::builder().build(manager)?)
}
