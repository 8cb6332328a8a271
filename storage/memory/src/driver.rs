//! In-memory storage driver implementation

use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::debug;

use satchel_core::{Driver, IterateVisitor, StorageError, Store, StoreConfig};

type InstanceMap = Arc<DashMap<String, Arc<MemoryStore>>>;

/// Ephemeral driver holding every store in process memory.
pub struct MemoryDriver {
    instances: InstanceMap,
}

impl MemoryDriver {
    pub fn new() -> Self { Self { instances: Arc::new(DashMap::new()) } }
}

impl Default for MemoryDriver {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn name(&self) -> &str { "memory" }

    async fn open(&self, config: &StoreConfig) -> Result<Arc<dyn Store>, StorageError> {
        let key = config.instance_key();
        let store = self
            .instances
            .entry(key.clone())
            .or_insert_with(|| Arc::new(MemoryStore { instance_key: key, data: RwLock::new(IndexMap::new()), instances: self.instances.clone() }))
            .clone();
        Ok(store)
    }
}

/// One store: an insertion-ordered map of serialized values.
pub struct MemoryStore {
    instance_key: String,
    data: RwLock<IndexMap<String, String>>,
    instances: InstanceMap,
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.read().expect("RwLock poisoned").get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // IndexMap keeps the original position when a key is overwritten
        self.data.write().expect("RwLock poisoned").insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().expect("RwLock poisoned").shift_remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.data.write().expect("RwLock poisoned").clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.data.read().expect("RwLock poisoned").keys().cloned().collect())
    }

    async fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        Ok(self.data.read().expect("RwLock poisoned").get_index(index).map(|(key, _)| key.clone()))
    }

    async fn length(&self) -> Result<u64, StorageError> { Ok(self.data.read().expect("RwLock poisoned").len() as u64) }

    async fn iterate(&self, visitor: &mut IterateVisitor<'_>) -> Result<(), StorageError> {
        // Snapshot so the visitor can call back into the store
        let entries: Vec<(String, String)> =
            self.data.read().expect("RwLock poisoned").iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        for (n, (key, value)) in entries.iter().enumerate() {
            if let ControlFlow::Break(()) = visitor(key, Some(value), n as u64 + 1) {
                break;
            }
        }
        Ok(())
    }

    async fn drop_instance(&self) -> Result<(), StorageError> {
        debug!("dropping memory store {}", self.instance_key);
        self.instances.remove(&self.instance_key);
        Ok(())
    }
}
