use std::ops::ControlFlow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::driver::Store;
use crate::error::StorageError;
use crate::serializer::{JsonSerializer, Serializer};

/// Typed handle over an untyped [`Store`].
///
/// Layers the configured [`Serializer`] on top of the driver's string
/// payloads, so callers work with serde types while every driver only ever
/// sees strings.
#[derive(Clone)]
pub struct Satchel {
    config: StoreConfig,
    store: Arc<dyn Store>,
    serializer: Arc<dyn Serializer>,
}

impl Satchel {
    pub fn new(store: Arc<dyn Store>, config: StoreConfig) -> Self {
        Self { config, store, serializer: Arc::new(JsonSerializer) }
    }

    pub fn with_serializer(store: Arc<dyn Store>, config: StoreConfig, serializer: Arc<dyn Serializer>) -> Self {
        Self { config, store, serializer }
    }

    pub fn config(&self) -> &StoreConfig { &self.config }

    /// The underlying untyped store.
    pub fn store(&self) -> &Arc<dyn Store> { &self.store }

    /// Read `key`, or `None` when it was never set.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get_item(key).await? {
            Some(payload) => {
                let json = self.serializer.deserialize(&payload)?;
                Ok(Some(serde_json::from_value(json)?))
            }
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, handing the value back on success.
    pub async fn set_item<T: Serialize + Send>(&self, key: &str, value: T) -> Result<T, StorageError> {
        let json = serde_json::to_value(&value)?;
        let payload = self.serializer.serialize(&json)?;
        self.store.set_item(key, &payload).await?;
        Ok(value)
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), StorageError> { self.store.remove_item(key).await }

    pub async fn clear(&self) -> Result<(), StorageError> { self.store.clear().await }

    pub async fn keys(&self) -> Result<Vec<String>, StorageError> { self.store.keys().await }

    /// The key at `index` in iteration order, or `None` past the end.
    pub async fn key(&self, index: usize) -> Result<Option<String>, StorageError> { self.store.key(index).await }

    pub async fn length(&self) -> Result<u64, StorageError> { self.store.length().await }

    /// Visit every entry as `(value, key, iteration_number)` with numbering
    /// starting at 1. Returning `Some` breaks the iteration early and hands
    /// that value back; a full pass returns `None`.
    pub async fn iterate<T, U, F>(&self, mut f: F) -> Result<Option<U>, StorageError>
    where
        T: DeserializeOwned,
        U: Send,
        F: FnMut(T, &str, u64) -> Option<U> + Send,
    {
        let serializer = self.serializer.clone();
        let mut broke_with: Option<U> = None;
        let mut failure: Option<StorageError> = None;

        let mut visitor = |key: &str, payload: Option<&str>, n: u64| -> ControlFlow<()> {
            let json = match payload {
                Some(payload) => match serializer.deserialize(payload) {
                    Ok(json) => json,
                    Err(e) => {
                        failure = Some(e);
                        return ControlFlow::Break(());
                    }
                },
                None => Value::Null,
            };
            let value: T = match serde_json::from_value(json) {
                Ok(value) => value,
                Err(e) => {
                    failure = Some(StorageError::Serialization(e));
                    return ControlFlow::Break(());
                }
            };
            match f(value, key, n) {
                Some(result) => {
                    broke_with = Some(result);
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            }
        };

        self.store.iterate(&mut visitor).await?;

        if let Some(e) = failure {
            return Err(e);
        }
        Ok(broke_with)
    }

    /// Discard the store instance and its data where the backend is durable.
    ///
    /// Handles opened through a [`crate::Registry`] should be dropped via
    /// [`crate::Registry::drop_instance`] so the shared-instance cache is
    /// evicted as well.
    pub async fn drop_instance(self) -> Result<(), StorageError> { self.store.drop_instance().await }
}
