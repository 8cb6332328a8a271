use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::StorageError;

/// Visitor for [`Store::iterate`].
///
/// Called once per entry with the key, the serialized value (`None` when the
/// backend holds no payload for the row), and the 1-based iteration number.
/// Returning `Break` stops the scan.
pub type IterateVisitor<'a> = dyn FnMut(&str, Option<&str>, u64) -> ControlFlow<()> + Send + 'a;

/// A pluggable storage back-end.
///
/// Drivers are registered with a [`crate::Registry`] and selected by name.
/// `open` performs any initialization the backend needs (creating database
/// files, tables, or maps) and returns the shared store for the config.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Name the driver registers under.
    fn name(&self) -> &str;

    /// Whether the driver can run in the current environment.
    async fn supports(&self) -> bool { true }

    /// Open (and create if necessary) the store for `config`.
    async fn open(&self, config: &StoreConfig) -> Result<Arc<dyn Store>, StorageError>;
}

/// One named partition of key-value pairs.
///
/// Values are serialized strings; the typed layer lives in [`crate::Satchel`].
/// Missing keys read as `None`, never an error, and `key(index)` past the end
/// is `None` as well.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Delete every entry in the store.
    async fn clear(&self) -> Result<(), StorageError>;

    /// All keys, in the store's stable iteration order.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// The key at `index` in iteration order, or `None` past the end.
    async fn key(&self, index: usize) -> Result<Option<String>, StorageError>;

    async fn length(&self) -> Result<u64, StorageError>;

    /// Visit every entry in iteration order until the visitor breaks.
    async fn iterate(&self, visitor: &mut IterateVisitor<'_>) -> Result<(), StorageError>;

    /// Discard this store instance: clear its data where the backend is
    /// durable and release the backing resources.
    async fn drop_instance(&self) -> Result<(), StorageError>;
}
