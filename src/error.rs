//! Error handling module for collnav
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Library code returns [`NavError`]; the binary wraps it with `anyhow` context.
//!
//! Recovery policy:
//! - `Payload` errors are recovered where the catalog is ingested
//! - `CacheEntryNotFound` and per-entry `Json` errors are recovered per record
//! - `Contract` errors are defects and propagate to the process boundary

use thiserror::Error;

/// Main error type for collnav
#[derive(Error, Debug)]
pub enum NavError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization errors (content views)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Storage errors from the content cache
    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    /// A key was not present in the content cache
    #[error("Cache entry not found: {0}")]
    CacheEntryNotFound(String),

    /// A value of the wrong shape was handed to a step, or a menu named a hidden column
    #[error("Contract violation: {0}")]
    Contract(String),

    /// The catalog producer returned something that is not a usable payload
    #[error("Malformed catalog payload: {0}")]
    Payload(String),

    /// The catalog producer could not be run
    #[error("Catalog producer failed: {0}")]
    Producer(String),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Result type alias for collnav operations
pub type Result<T> = std::result::Result<T, NavError>;

// Convenient error constructors
impl NavError {
    /// Create a contract violation
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Create a payload error
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    /// Create a producer error
    pub fn producer(msg: impl Into<String>) -> Self {
        Self::Producer(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// True for programming defects that must not be swallowed.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}
