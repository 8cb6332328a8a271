//! Driver contract and host surface for satchel key-value storage.
//!
//! satchel stores string keys mapped to serialized values in a named [`Store`].
//! A store is identified by a `(name, store_name)` pair, where `name` selects
//! the backing database and `store_name` a partition within it. Drivers are
//! interchangeable back-ends satisfying the [`Driver`]/[`Store`] contract;
//! this crate owns the contract plus everything drivers share:
//!
//! - [`StoreConfig`]: naming for a store instance
//! - [`Serializer`]: value <-> string conversion (JSON by default)
//! - [`Registry`]: driver registration, preference-order selection, and
//!   shared store instances
//! - [`Satchel`]: a typed handle layering serde over an untyped store
//!
//! ```rust,ignore
//! let registry = Registry::new();
//! registry.define_driver(Arc::new(MemoryDriver::new()));
//! registry.set_driver("memory").await?;
//!
//! let store = registry.open().await?;
//! store.set_item("office", "Initech").await?;
//! assert_eq!(store.get_item::<String>("office").await?.as_deref(), Some("Initech"));
//! ```

mod config;
mod driver;
mod error;
mod handle;
mod registry;
mod serializer;

pub use config::StoreConfig;
pub use driver::{Driver, IterateVisitor, Store};
pub use error::StorageError;
pub use handle::Satchel;
pub use registry::Registry;
pub use serializer::{JsonSerializer, Serializer};

// [`Serializer`] speaks in JSON values; re-export the type so implementors
// need not depend on serde_json themselves.
pub use serde_json::Value;
