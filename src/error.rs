//! Error types for the navigator

use thiserror::Error;

/// Errors raised by the navigator and its collaborators
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The tracked robot object no longer exists in the simulator
    #[error("robot pose unavailable: {0}")]
    PoseUnavailable(String),

    /// The motor command was rejected
    #[error("wheel actuation failed: {0}")]
    ActuationError(String),

    /// The range sensors could not be read
    #[error("range sensors unavailable: {0}")]
    SensorUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, NavigationError>;
