//! Error types for the SQLite storage driver

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("task join error: {0}")]
    TaskJoin(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqliteError {
    /// Whether the failure means the underlying connection went away (as
    /// opposed to a statement-level error). These are the cases worth one
    /// retry on a fresh connection.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            SqliteError::Rusqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<SqliteError> for satchel_core::StorageError {
    fn from(err: SqliteError) -> Self { satchel_core::StorageError::backend(err) }
}
