//! Driver contract suite
//!
//! The same assertions run against every driver variant (memory, SQLite
//! per-name, SQLite shared-database); any divergence between back-ends is a
//! bug in the driver, not the suite.


use anyhow::Result;
use common::{open, DriverPark};
use satchel_core::StoreConfig;

#[tokio::test]
async fn has_an_empty_length_by_default() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "empty")).await;
        assert_eq!(store.length().await?, 0, "{label}");
        assert_eq!(store.keys().await?, Vec::<String>::new(), "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn saves_and_retrieves_an_item() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "saves")).await;

        let set = store.set_item("office", "Initech".to_string()).await?;
        assert_eq!(set, "Initech", "{label}: set_item hands the value back");
        assert_eq!(store.get_item::<String>("office").await?.as_deref(), Some("Initech"), "{label}");
        assert_eq!(store.length().await?, 1, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn saves_over_an_existing_key() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "overwrite")).await;

        store.set_item("4th floor", "Mozilla".to_string()).await?;
        store.set_item("4th floor", "Quora".to_string()).await?;
        assert_eq!(store.get_item::<String>("4th floor").await?.as_deref(), Some("Quora"), "{label}");
        assert_eq!(store.length().await?, 1, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn returns_none_for_a_missing_key() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "missing")).await;
        assert_eq!(store.get_item::<String>("undef").await?, None, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn key_index_behaves_like_local_storage() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "keyindex")).await;

        assert_eq!(store.key(0).await?, None, "{label}: empty store");

        store.set_item("office", "Initech".to_string()).await?;
        assert_eq!(store.key(0).await?.as_deref(), Some("office"), "{label}");
        assert_eq!(store.key(1).await?, None, "{label}: past the end");
    }
    Ok(())
}

#[tokio::test]
async fn removes_one_item_and_leaves_the_rest() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "removes")).await;

        store.set_item("office", "Initech".to_string()).await?;
        store.set_item("otherOffice", "Initrode".to_string()).await?;
        store.remove_item("office").await?;

        assert_eq!(store.get_item::<String>("office").await?, None, "{label}");
        assert_eq!(store.get_item::<String>("otherOffice").await?.as_deref(), Some("Initrode"), "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn clear_removes_all_items() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "clears")).await;

        store.set_item("office", "Initech".to_string()).await?;
        store.set_item("otherOffice", "Initrode".to_string()).await?;
        assert_eq!(store.length().await?, 2, "{label}");

        store.clear().await?;
        assert_eq!(store.get_item::<String>("office").await?, None, "{label}: get after clear");
        assert_eq!(store.length().await?, 0, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn iterate_visits_entries_in_order() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "iterates")).await;

        store.set_item("officeX", "InitechX".to_string()).await?;
        store.set_item("officeY", "InitechY".to_string()).await?;

        let mut accumulator = Vec::new();
        let broke = store
            .iterate(|value: String, key: &str, n: u64| -> Option<()> {
                accumulator.push((key.to_string(), value, n));
                None
            })
            .await?;

        assert_eq!(broke, None, "{label}");
        assert_eq!(
            accumulator,
            vec![("officeX".to_string(), "InitechX".to_string(), 1), ("officeY".to_string(), "InitechY".to_string(), 2)],
            "{label}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn iterate_breaks_with_a_defined_return_value() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "breaks")).await;

        store.set_item("officeX", "InitechX".to_string()).await?;
        store.set_item("officeY", "InitechY".to_string()).await?;

        let mut visited = 0u32;
        let broke = store
            .iterate(|_value: String, _key: &str, _n: u64| {
                visited += 1;
                Some("Some value!")
            })
            .await?;

        assert_eq!(broke, Some("Some value!"), "{label}");
        assert_eq!(visited, 1, "{label}: loop is broken within the first iteration");
    }
    Ok(())
}

#[tokio::test]
async fn iterates_only_its_own_entries() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "own")).await;
        let other = open(driver, StoreConfig::new("app", "foreign")).await;

        other.set_item("local", "forage".to_string()).await?;
        store.set_item("office", "Initech".to_string()).await?;
        store.set_item("name", "Bob".to_string()).await?;

        let mut numbers = String::new();
        store
            .iterate(|_value: String, key: &str, n: u64| -> Option<()> {
                assert_ne!(key, "local", "{label}");
                numbers.push_str(&n.to_string());
                None
            })
            .await?;

        assert_eq!(numbers, "12", "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn instances_do_not_see_each_other() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store1 = open(driver, StoreConfig::new("storage2", "storagename2")).await;
        let store2 = open(driver, StoreConfig::new("storage2", "storagename3")).await;
        let store3 = open(driver, StoreConfig::new("storage4", "storagename2")).await;

        store1.set_item("key1", "value1a".to_string()).await?;
        store2.set_item("key2", "value2a".to_string()).await?;
        store3.set_item("key3", "value3a".to_string()).await?;

        assert_eq!(store1.get_item::<String>("key2").await?, None, "{label}");
        assert_eq!(store2.get_item::<String>("key1").await?, None, "{label}");
        assert_eq!(store2.get_item::<String>("key3").await?, None, "{label}");
        assert_eq!(store3.get_item::<String>("key2").await?, None, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn same_key_in_different_stores_keeps_its_own_value() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store1 = open(driver, StoreConfig::new("storage3", "store1")).await;
        let store2 = open(driver, StoreConfig::new("storage3", "store2")).await;
        let store3 = open(driver, StoreConfig::new("storage3", "store3")).await;

        store1.set_item("key", "value1".to_string()).await?;
        store2.set_item("key", "value2".to_string()).await?;
        store3.set_item("key", "value3".to_string()).await?;

        assert_eq!(store1.get_item::<String>("key").await?.as_deref(), Some("value1"), "{label}");
        assert_eq!(store2.get_item::<String>("key").await?.as_deref(), Some("value2"), "{label}");
        assert_eq!(store3.get_item::<String>("key").await?.as_deref(), Some("value3"), "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn stores_non_string_values() -> Result<()> {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rapper {
        name: String,
        albums: u32,
    }

    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let store = open(driver, StoreConfig::new("app", "typed")).await;

        store.set_item("count", 1u64).await?;
        store.set_item("rapper", Rapper { name: "Black Thought".to_string(), albums: 11 }).await?;
        store.set_item("nothing", Option::<String>::None).await?;

        assert_eq!(store.get_item::<u64>("count").await?, Some(1), "{label}");
        assert_eq!(
            store.get_item::<Rapper>("rapper").await?,
            Some(Rapper { name: "Black Thought".to_string(), albums: 11 }),
            "{label}"
        );
        assert_eq!(store.get_item::<Option<String>>("nothing").await?, Some(None), "{label}: stored null reads back as null");
    }
    Ok(())
}

#[tokio::test]
async fn a_custom_serializer_controls_the_stored_payload() -> Result<()> {
    use std::sync::Arc;

    use satchel_core::{Driver, JsonSerializer, Satchel, Serializer, StorageError, Store, Value};
    use satchel_storage_memory::MemoryDriver;

    /// JSON payloads tagged with a format version, as a migration hook.
    struct VersionedSerializer;

    impl Serializer for VersionedSerializer {
        fn serialize(&self, value: &Value) -> Result<String, StorageError> {
            Ok(format!("v1:{}", JsonSerializer.serialize(value)?))
        }

        fn deserialize(&self, payload: &str) -> Result<Value, StorageError> {
            let rest = payload
                .strip_prefix("v1:")
                .ok_or_else(|| StorageError::backend(std::io::Error::other("payload is missing its version tag")))?;
            JsonSerializer.deserialize(rest)
        }
    }

    let driver = MemoryDriver::new();
    let config = StoreConfig::new("app", "versioned");
    let store = Satchel::with_serializer(driver.open(&config).await?, config, Arc::new(VersionedSerializer));

    store.set_item("office", "Initech".to_string()).await?;
    assert_eq!(store.get_item::<String>("office").await?.as_deref(), Some("Initech"));

    // The driver persisted the tagged payload, not plain JSON
    assert_eq!(store.store().get_item("office").await?.as_deref(), Some("v1:\"Initech\""));
    Ok(())
}

#[tokio::test]
async fn drop_instance_discards_the_store() -> Result<()> {
    let park = DriverPark::new();
    for (label, driver) in &park.drivers {
        let config = StoreConfig::new("app", "dropped");
        let store = open(driver, config.clone()).await;
        store.set_item("office", "Initech".to_string()).await?;
        store.drop_instance().await?;

        let fresh = open(driver, config).await;
        assert_eq!(fresh.length().await?, 0, "{label}");
    }
    Ok(())
}
