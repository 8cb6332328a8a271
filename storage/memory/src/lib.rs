//! In-memory storage driver for satchel
//!
//! Ephemeral key-value storage with the same contract as the durable drivers.
//! Entries live in an insertion-ordered map, so `keys`/`key(n)`/`iterate`
//! follow insertion order. One store instance exists per `(name, store_name)`
//! pair; opening the same config twice through the same driver yields handles
//! over the same map.
//!
//! Nothing survives the driver: `drop_instance` (or dropping the driver
//! itself) discards the data.

mod driver;

pub use driver::{MemoryDriver, MemoryStore};
