//! SQLite storage driver for satchel
//!
//! Durable key-value storage in device-local SQLite databases. Each store is
//! one table of `(id, key, value)` rows; every operation is a single
//! statement. Two naming strategies are available:
//!
//! - per-name (default): one database file per config `name`, one table per
//!   `store_name`
//! - shared: every store in a single database, table names formed by
//!   concatenating `name` and `store_name`
//!
//! # Example
//!
//! ```rust,ignore
//! use satchel_storage_sqlite::SqliteDriver;
//!
//! let driver = SqliteDriver::new("/var/lib/myapp");
//!
//! // Or in-memory databases for testing
//! let driver = SqliteDriver::in_memory();
//! ```

mod connection;
mod driver;
mod error;

pub use connection::{PooledConnection, SqliteConnectionManager, SqliteLocation};
pub use driver::{DatabaseStrategy, SqliteDriver, SqliteStore, DEFAULT_POOL_SIZE};
pub use error::SqliteError;
