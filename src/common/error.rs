//! Error types for apiprobe
//!
//! Only conditions that stop a run are errors. Failures of individual
//! steps are recorded as outcomes in the ledger and never surface here.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apiprobe
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Scenario Errors ===
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    // === Setup Errors ===
    #[error("Failed to obtain credentials for role '{role}': {reason}")]
    Setup { role: String, reason: String },

    // === HTTP Errors ===
    #[error("HTTP client error: {0}")]
    Http(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a setup error for a role
    pub fn setup(role: &str, reason: impl Into<String>) -> Self {
        Self::Setup {
            role: role.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid scenario error
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario(message.into())
    }

    /// Whether this error aborted credential acquisition
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }
}
