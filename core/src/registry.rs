use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tracing::debug;

use crate::config::StoreConfig;
use crate::driver::{Driver, Store};
use crate::error::StorageError;
use crate::handle::Satchel;

/// Registers drivers and hands out shared store instances.
///
/// One store instance exists per `(name, store_name)` pair; opening the same
/// config twice returns handles over the same instance. Driver selection
/// follows preference order: [`Registry::set_driver_order`] picks the first
/// name that is registered and supported.
pub struct Registry {
    drivers: DashMap<String, Arc<dyn Driver>>,
    current: RwLock<Option<String>>,
    instances: DashMap<String, Arc<dyn Store>>,
}

impl Registry {
    pub fn new() -> Self { Self { drivers: DashMap::new(), current: RwLock::new(None), instances: DashMap::new() } }

    /// Register a driver under its own name. Re-defining a name replaces the
    /// previous driver but leaves already-open instances untouched.
    pub fn define_driver(&self, driver: Arc<dyn Driver>) {
        debug!("define_driver: {}", driver.name());
        self.drivers.insert(driver.name().to_string(), driver);
    }

    /// Whether a driver with this name is registered.
    pub fn supports(&self, name: &str) -> bool { self.drivers.contains_key(name) }

    /// The currently selected driver name, if any.
    pub fn driver(&self) -> Option<String> { self.current.read().expect("RwLock poisoned").clone() }

    /// Select a driver by name.
    pub async fn set_driver(&self, name: &str) -> Result<(), StorageError> { self.set_driver_order(&[name]).await }

    /// Select the first registered and supported driver from `names`.
    pub async fn set_driver_order(&self, names: &[&str]) -> Result<(), StorageError> {
        for name in names {
            let Some(driver) = self.drivers.get(*name).map(|d| d.value().clone()) else {
                debug!("set_driver_order: {name} is not registered, skipping");
                continue;
            };
            if driver.supports().await {
                *self.current.write().expect("RwLock poisoned") = Some(name.to_string());
                return Ok(());
            }
            debug!("set_driver_order: {name} is not supported here, skipping");
        }
        Err(StorageError::UnsupportedDriver(names.iter().map(|n| n.to_string()).collect()))
    }

    /// Open the default store (`satchel` / `keyvaluepairs`) on the selected driver.
    pub async fn open(&self) -> Result<Satchel, StorageError> { self.open_with(StoreConfig::default()).await }

    /// Open (creating if necessary) the store for `config` on the selected driver.
    pub async fn open_with(&self, config: StoreConfig) -> Result<Satchel, StorageError> {
        let name = self.driver().ok_or(StorageError::NoDriverSelected)?;
        let driver = self.drivers.get(&name).map(|d| d.value().clone()).ok_or_else(|| StorageError::NoSuchDriver(name.clone()))?;

        let key = config.instance_key();
        if let Some(store) = self.instances.get(&key).map(|s| s.value().clone()) {
            return Ok(Satchel::new(store, config));
        }

        let store = driver.open(&config).await?;
        // A concurrent open may have won the race; keep whichever landed first.
        let store = self.instances.entry(key).or_insert(store).clone();
        Ok(Satchel::new(store, config))
    }

    /// Drop the store for `config`: discard its data where durable and evict
    /// it from the shared-instance cache.
    pub async fn drop_instance(&self, config: &StoreConfig) -> Result<(), StorageError> {
        let key = config.instance_key();
        if let Some((_, store)) = self.instances.remove(&key) {
            store.drop_instance().await?;
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self { Self::new() }
}
