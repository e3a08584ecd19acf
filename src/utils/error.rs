// src/utils/error.rs
use std::io;
use thiserror::Error;

/// Failure of a single call to a collaborator service
///
/// Every variant is transient from the mining loop's point of view: the
/// iteration is skipped and counted, never propagated to a control caller.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure, timeout or undecodable body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collaborator answered with a non-success status code
    #[error("{service} returned status {status}")]
    Status {
        /// Which collaborator answered ("rng" or "hasher")
        service: &'static str,
        /// HTTP status code received
        status: u16,
    },

    /// Payload decoded but violates the collaborator contract
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Errors raised by a shared store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Store could not be reached
    #[error("Shared store unavailable")]
    Unavailable,

    /// A stored value could not be parsed into the expected type
    #[error("Unparseable value {value:?} at key {key}")]
    Parse {
        /// Store key that was read
        key: String,
        /// Raw value found under the key
        value: String,
    },

    /// A value could not be serialized before being written
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Unrecoverable failure inside the mining loop body
///
/// The loop reacts by forcing the coordinator to idle; an operator has to
/// start mining again by hand.
#[derive(Error, Debug)]
pub enum LoopError {
    /// Persisting a mined result or the counters failed
    #[error("Failed to persist mining progress: {0}")]
    Persist(#[from] StoreError),

    /// A manual iteration was requested while the background loop runs
    #[error("Mining loop is running; stop it before mining manually")]
    Running,
}

/// Top-level error type for startup and configuration paths
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Configuration file, environment or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Shared store errors raised outside the mining loop
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Collaborator client construction errors
    #[error("Client error: {0}")]
    ClientError(#[from] ClientError),
}

/// Converts URL parsing errors into configuration errors
///
/// Collaborator base URLs are only parsed while loading configuration.
impl From<url::ParseError> for CoordinatorError {
    fn from(e: url::ParseError) -> Self {
        CoordinatorError::ConfigError(format!("Invalid URL: {}", e))
    }
}
