//! Error types for the focus_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for focus_core operations
///
/// Only the persistence, configuration and parsing layers return these.
/// Timer and progression operations resolve every edge case to a state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Timer definition could not be understood
    #[error("Invalid timer: {0}")]
    InvalidTimer(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
