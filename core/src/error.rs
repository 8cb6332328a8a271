use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no driver named {0:?} is registered")]
    NoSuchDriver(String),

    #[error("none of the requested drivers are supported: {0:?}")]
    UnsupportedDriver(Vec<String>),

    #[error("no driver selected")]
    NoDriverSelected,

    #[error("invalid store name {0:?}")]
    InvalidStoreName(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl StorageError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self { StorageError::Backend(Box::new(err)) }
}
