//! Error types for Wharf

use thiserror::Error;

/// Result type for Wharf operations
pub type Result<T> = std::result::Result<T, WharfError>;

/// Wharf error types
#[derive(Error, Debug)]
pub enum WharfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image not found locally: {0}")]
    ImageNotFound(String),

    #[error("Engine communication failed: {0}")]
    Engine(String),

    #[error("Container {0} closed its log stream before matching the readiness pattern")]
    NotReady(String),

    #[error("Container {id} failed (exit code {status_code})")]
    ContainerFailed { id: String, status_code: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for WharfError {
    fn from(err: bollard::errors::Error) -> Self {
        WharfError::Engine(err.to_string())
    }
}
