use serde_json::Value;

use crate::error::StorageError;

/// Converts values to and from the string representation drivers persist.
///
/// Drivers never interpret payloads; they store whatever string the serializer
/// produced and hand it back verbatim on read.
pub trait Serializer: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<String, StorageError>;

    fn deserialize(&self, payload: &str) -> Result<Value, StorageError>;
}

/// Default serializer: compact JSON text.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String, StorageError> { Ok(serde_json::to_string(value)?) }

    fn deserialize(&self, payload: &str) -> Result<Value, StorageError> { Ok(serde_json::from_str(payload)?) }
}
