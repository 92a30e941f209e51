use thiserror::Error;

/// Top-level error type for voxchat.
///
/// Subsystem errors in `voxchat-action` wrap this type when a failure comes
/// from configuration, the filesystem, or (de)serialization, so the `?`
/// operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoxchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VoxchatError {
    fn from(err: toml::de::Error) -> Self {
        VoxchatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoxchatError {
    fn from(err: toml::ser::Error) -> Self {
        VoxchatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VoxchatError {
    fn from(err: serde_json::Error) -> Self {
        VoxchatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for voxchat operations.
pub type Result<T> = std::result::Result<T, VoxchatError>;
