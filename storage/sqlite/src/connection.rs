//! bb8 connection management for rusqlite
//!
//! rusqlite connections are not `Send`, so each pooled connection lives behind
//! an async mutex and every statement runs inside `spawn_blocking`.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::error::SqliteError;

/// Where a database lives.
#[derive(Clone, Debug)]
pub enum SqliteLocation {
    /// On-disk database file.
    File(PathBuf),
    /// In-memory database (tests). Pools over this must be capped at one
    /// connection: each new in-memory connection is a fresh empty database.
    Memory,
}

/// bb8 connection manager for one SQLite database.
pub struct SqliteConnectionManager {
    location: SqliteLocation,
}

impl SqliteConnectionManager {
    pub fn new(location: SqliteLocation) -> Self { Self { location } }

    pub fn file(path: impl Into<PathBuf>) -> Self { Self::new(SqliteLocation::File(path.into())) }

    pub fn memory() -> Self { Self::new(SqliteLocation::Memory) }

    fn open(&self) -> Result<Connection, SqliteError> {
        let conn = match &self.location {
            SqliteLocation::File(path) => Connection::open(path)?,
            SqliteLocation::Memory => Connection::open_in_memory()?,
        };

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
        )?;

        Ok(conn)
    }
}

/// A pooled connection handle.
///
/// Statements are handed in as closures and executed on the blocking pool
/// while the async mutex serializes access to the connection.
pub struct PooledConnection {
    inner: Arc<Mutex<Connection>>,
}

impl PooledConnection {
    pub fn new(conn: Connection) -> Self { Self { inner: Arc::new(Mutex::new(conn)) } }

    /// Run `f` against the connection on the blocking pool.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, SqliteError>
    where
        F: FnOnce(&Connection) -> Result<T, SqliteError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard)
        })
        .await
        .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
    }
}

impl bb8::ManageConnection for SqliteConnectionManager {
    type Connection = PooledConnection;
    type Error = SqliteError;

    fn connect(&self) -> impl std::future::Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let location = self.location.clone();
        async move {
            let manager = SqliteConnectionManager::new(location);
            tokio::task::spawn_blocking(move || manager.open().map(PooledConnection::new))
                .await
                .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    #[allow(refining_impl_trait)]
    fn is_valid<'a, 'b>(&'a self, conn: &'b mut Self::Connection) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        let inner = conn.inner.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                let guard = inner.blocking_lock();
                guard.execute_batch("SELECT 1").map_err(SqliteError::from)
            })
            .await
            .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool { false }
}
