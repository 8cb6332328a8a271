use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "satchel";
pub const DEFAULT_STORE_NAME: &str = "keyvaluepairs";

/// Naming for a store instance.
///
/// `name` selects the backing database and `store_name` a partition within it.
/// Two configs with the same `(name, store_name)` pair refer to the same data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub store_name: String,
    pub description: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { name: DEFAULT_NAME.to_string(), store_name: DEFAULT_STORE_NAME.to_string(), description: None }
    }
}

impl StoreConfig {
    pub fn new(name: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self { name: name.into(), store_name: store_name.into(), description: None }
    }

    /// Cache key identifying the shared instance for this config.
    pub fn instance_key(&self) -> String { format!("{}-{}", self.name, self.store_name) }
}
