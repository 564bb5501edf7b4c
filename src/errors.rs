//! Error taxonomy for the registry adapter boundary and the router as a whole.

use std::path::PathBuf;
use thiserror::Error;

/// Errors local to a [`crate::registry::RegistryAdapter`] implementation.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("registry unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("malformed registry response: {0}")]
    Malformed(String),

    #[error("body integrity mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
}

/// Errors that can reach the top-level routing routine.
///
/// Every variant here corresponds to a row in the error-handling table
/// (spec's error taxonomy): none of them are ever surfaced to the caller
/// directly. [`crate::router::Router::route`] collapses all of them into a
/// silent empty result.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("stdin is not valid JSON or missing `prompt`: {0}")]
    InputMalformed(#[from] serde_json::Error),

    #[error("registry unreachable and no usable cache: {0}")]
    RegistryNetwork(String),

    #[error("registry index malformed: {0}")]
    RegistryMalformed(String),

    #[error("cache entry corrupt at {0}")]
    CacheCorrupt(PathBuf),

    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<AdapterError> for RouterError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::NotFound(m) => RouterError::RegistryNetwork(m),
            AdapterError::NetworkUnavailable(m) => RouterError::RegistryNetwork(m),
            AdapterError::Malformed(m) => RouterError::RegistryMalformed(m),
            AdapterError::IntegrityMismatch { expected, actual } => RouterError::RegistryMalformed(
                format!("integrity mismatch: expected {expected}, got {actual}"),
            ),
        }
    }
}
