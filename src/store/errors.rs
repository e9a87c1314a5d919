//! Error types for the extension store
//!
//! Store failures fall into two groups: transient contention that a
//! `RetryPolicy` may absorb, and everything else, which is surfaced as-is.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported `SQLITE_BUSY` / `SQLITE_LOCKED` (transient)
    #[error("Store is busy (retry recommended): {0}")]
    Busy(String),

    /// Waiting for a pooled connection timed out (transient)
    #[error("Store operation timed out (retry recommended): {0}")]
    Timeout(String),

    /// Connection to the database was lost or could not be opened (transient)
    #[error("Store connection failed (retry recommended): {0}")]
    Connection(String),

    /// Schema or uniqueness constraint rejected the write
    #[error("Store constraint violated: {0}")]
    Constraint(String),

    /// A value could not be encoded for, or decoded from, the database
    #[error("Malformed record data: {0}")]
    Malformed(String),

    /// Any other database failure
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Check if error is transient and should be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Busy(_) | StoreError::Timeout(_) | StoreError::Connection(_)
        )
    }
}

// SQLite primary result codes (extended codes keep these in the low byte)
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                let primary_code = db
                    .code()
                    .and_then(|code| code.parse::<i64>().ok())
                    .map(|code| code & 0xff);

                if matches!(primary_code, Some(SQLITE_BUSY | SQLITE_LOCKED))
                    || message.contains("database is locked")
                {
                    StoreError::Busy(message)
                } else if db.is_unique_violation()
                    || db.is_check_violation()
                    || db.is_foreign_key_violation()
                {
                    StoreError::Constraint(message)
                } else {
                    StoreError::Other(message)
                }
            }
            sqlx::Error::PoolTimedOut => StoreError::Timeout("connection pool timed out".into()),
            sqlx::Error::PoolClosed => StoreError::Connection("connection pool is closed".into()),
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::WorkerCrashed => StoreError::Connection("database worker crashed".into()),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Malformed(format!("column {index}: {source}"))
            }
            sqlx::Error::Decode(e) => StoreError::Malformed(e.to_string()),
            other => StoreError::Other(other.to_string()),
        }
    }
}
