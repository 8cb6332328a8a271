//! SQLite storage driver implementation

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::debug;

use satchel_core::{Driver, IterateVisitor, StorageError, Store, StoreConfig};

use crate::connection::SqliteConnectionManager;
use crate::error::SqliteError;

/// Default connection pool size for on-disk databases
pub const DEFAULT_POOL_SIZE: u32 = 10;

type PoolMap = Arc<tokio::sync::Mutex<HashMap<String, bb8::Pool<SqliteConnectionManager>>>>;

/// How store configs map onto database files.
#[derive(Clone, Debug, Default)]
pub enum DatabaseStrategy {
    /// One database file per `config.name`, one table per `store_name`.
    #[default]
    PerName,
    /// Every store lands in a single database; table names are the
    /// concatenation of `name` and `store_name`. Useful when the platform
    /// handles multiple open databases poorly.
    Shared { database: String },
}

impl DatabaseStrategy {
    fn tag(&self) -> &'static str {
        match self {
            DatabaseStrategy::PerName => "per_name",
            DatabaseStrategy::Shared { .. } => "shared",
        }
    }
}

/// Durable driver backed by device-local SQLite databases.
///
/// Databases live under `root` as `<database>.sqlite3`; each store is one
/// table of `(id, key, value)` rows. With no root, databases are in-memory
/// (tests).
pub struct SqliteDriver {
    root: Option<PathBuf>,
    strategy: DatabaseStrategy,
    driver_name: String,
    pools: PoolMap,
}

impl SqliteDriver {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self::with_strategy(root, DatabaseStrategy::PerName) }

    pub fn with_strategy(root: impl Into<PathBuf>, strategy: DatabaseStrategy) -> Self {
        Self::build(Some(root.into()), strategy)
    }

    /// In-memory databases, one per database name (for testing).
    ///
    /// An in-memory database lives only as long as its pool. After
    /// [`Store::drop_instance`] evicts the pool, any store still holding the
    /// old pool keeps the old database while the next open gets a fresh
    /// empty one. On-disk databases converge on the same file instead.
    pub fn in_memory() -> Self { Self::build(None, DatabaseStrategy::PerName) }

    pub fn in_memory_with_strategy(strategy: DatabaseStrategy) -> Self { Self::build(None, strategy) }

    fn build(root: Option<PathBuf>, strategy: DatabaseStrategy) -> Self {
        let driver_name = format!("sqlite.{}", strategy.tag());
        Self { root, strategy, driver_name, pools: Arc::new(tokio::sync::Mutex::new(HashMap::new())) }
    }

    /// Check that a name is safe to interpolate into SQL
    pub fn sane_name(name: &str) -> bool {
        !name.is_empty()
            && name.chars().all(|c| match c {
                c if c.is_alphanumeric() => true,
                '_' | '.' | ':' => true,
                _ => false,
            })
    }

    fn database_name(&self, config: &StoreConfig) -> String {
        match &self.strategy {
            DatabaseStrategy::PerName => config.name.clone(),
            DatabaseStrategy::Shared { database } => database.clone(),
        }
    }

    fn table_name(&self, config: &StoreConfig) -> String {
        match &self.strategy {
            DatabaseStrategy::PerName => config.store_name.clone(),
            DatabaseStrategy::Shared { .. } => format!("{}{}", config.name, config.store_name),
        }
    }

    /// Get or create the pool for a database.
    async fn pool(&self, database: &str) -> Result<bb8::Pool<SqliteConnectionManager>, SqliteError> {
        let mut pools = self.pools.lock().await;
        if let Some(pool) = pools.get(database) {
            return Ok(pool.clone());
        }

        let (manager, max_size) = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                (SqliteConnectionManager::file(root.join(format!("{database}.sqlite3"))), DEFAULT_POOL_SIZE)
            }
            // A single connection keeps the in-memory database alive
            None => (SqliteConnectionManager::memory(), 1),
        };

        debug!("opening database {database} (max {max_size} connections)");
        let pool = bb8::Pool::builder().max_size(max_size).build(manager).await?;
        pools.insert(database.to_string(), pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &str { &self.driver_name }

    async fn open(&self, config: &StoreConfig) -> Result<Arc<dyn Store>, StorageError> {
        let database = self.database_name(config);
        let table = self.table_name(config);
        if !Self::sane_name(&database) {
            return Err(StorageError::InvalidStoreName(database));
        }
        if !Self::sane_name(&table) {
            return Err(StorageError::InvalidStoreName(table));
        }

        let pool = self.pool(&database).await?;
        let store = SqliteStore { pool, pools: self.pools.clone(), database, table };
        store.create_table().await?;
        Ok(Arc::new(store))
    }
}

/// One store: a single `(id, key, value)` table in its database.
pub struct SqliteStore {
    pool: bb8::Pool<SqliteConnectionManager>,
    pools: PoolMap,
    database: String,
    table: String,
}

impl SqliteStore {
    /// Run a statement, retrying once on a fresh connection if the current
    /// one turns out to have gone away.
    async fn run<F, T>(&self, f: F) -> Result<T, SqliteError>
    where
        F: Fn(&Connection) -> Result<T, SqliteError> + Clone + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| SqliteError::Pool(e.to_string()))?;
        match conn.with_connection(f.clone()).await {
            Err(e) if e.is_connection_lost() => {
                debug!("connection to {} lost ({e}), retrying once", self.database);
                drop(conn);
                let conn = self.pool.get().await.map_err(|e| SqliteError::Pool(e.to_string()))?;
                conn.with_connection(f).await
            }
            other => other,
        }
    }

    async fn create_table(&self) -> Result<(), SqliteError> {
        let query = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                "id" INTEGER PRIMARY KEY,
                "key" TEXT NOT NULL UNIQUE,
                "value" TEXT
            )"#,
            self.table
        );
        debug!("creating store table: {query}");
        self.run(move |c| {
            c.execute(&query, [])?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let query = format!(r#"SELECT "value" FROM "{}" WHERE "key" = ?1 LIMIT 1"#, self.table);
        let key = key.to_string();
        let value = self
            .run(move |c| match c.query_row(&query, [&key], |row| row.get::<_, Option<String>>(0)) {
                Ok(value) => Ok(value),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(SqliteError::Rusqlite(e)),
            })
            .await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let query = format!(r#"INSERT OR REPLACE INTO "{}" ("key", "value") VALUES (?1, ?2)"#, self.table);
        let key = key.to_string();
        let value = value.to_string();
        self.run(move |c| {
            c.execute(&query, rusqlite::params![key, value])?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let query = format!(r#"DELETE FROM "{}" WHERE "key" = ?1"#, self.table);
        let key = key.to_string();
        self.run(move |c| {
            c.execute(&query, [&key])?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let query = format!(r#"DELETE FROM "{}""#, self.table);
        debug!("clear: {query}");
        self.run(move |c| {
            c.execute(&query, [])?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let query = format!(r#"SELECT "key" FROM "{}" ORDER BY "id""#, self.table);
        let keys = self
            .run(move |c| {
                let mut stmt = c.prepare(&query)?;
                let keys = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await?;
        Ok(keys)
    }

    async fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        // Nth live row in rowid order. The OFFSET keeps this stable across
        // deletes, unlike addressing rowids directly.
        let query = format!(r#"SELECT "key" FROM "{}" ORDER BY "id" LIMIT 1 OFFSET ?1"#, self.table);
        let key = self
            .run(move |c| match c.query_row(&query, [index as i64], |row| row.get::<_, String>(0)) {
                Ok(key) => Ok(Some(key)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(SqliteError::Rusqlite(e)),
            })
            .await?;
        Ok(key)
    }

    async fn length(&self) -> Result<u64, StorageError> {
        let query = format!(r#"SELECT COUNT("key") FROM "{}""#, self.table);
        let count = self.run(move |c| Ok(c.query_row(&query, [], |row| row.get::<_, i64>(0))?)).await?;
        Ok(count as u64)
    }

    async fn iterate(&self, visitor: &mut IterateVisitor<'_>) -> Result<(), StorageError> {
        let query = format!(r#"SELECT "key", "value" FROM "{}" ORDER BY "id""#, self.table);
        let rows: Vec<(String, Option<String>)> = self
            .run(move |c| {
                let mut stmt = c.prepare(&query)?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        for (n, (key, value)) in rows.iter().enumerate() {
            if let ControlFlow::Break(()) = visitor(key, value.as_deref(), n as u64 + 1) {
                break;
            }
        }
        Ok(())
    }

    async fn drop_instance(&self) -> Result<(), StorageError> {
        self.clear().await?;

        // Release the database handle; the next open builds a fresh pool.
        // Sibling stores in the same database keep their pool clone and stay
        // usable, though under in-memory databases they diverge from the
        // freshly opened one.
        let mut pools = self.pools.lock().await;
        if pools.remove(&self.database).is_some() {
            debug!("closed database {}", self.database);
        }
        Ok(())
    }
}
