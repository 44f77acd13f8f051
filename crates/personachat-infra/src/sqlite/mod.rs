//! SQLite storage layer.
//!
//! Message store and session registry backed by SQLite with WAL mode and
//! split read/write connection pools.

pub mod message;
pub mod pool;
pub mod registry;

use personachat_types::error::RepositoryError;

/// Pool and I/O failures mean the database is unreachable; everything else
/// is reported as a failed query.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}
