//! Error types for dietqa

use crate::llm::Stage;
use thiserror::Error;

/// Result type alias using DietQaError
pub type Result<T> = std::result::Result<T, DietQaError>;

/// Error type alias for convenience
pub type Error = DietQaError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const EXTERNAL_ERROR: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for dietqa
#[derive(Debug, Error)]
pub enum DietQaError {
    /// The model answered, but its JSON payload lacks the key a stage needs
    #[error("Malformed model output in {stage} stage: missing or invalid \"{key}\"")]
    MalformedOutput { stage: Stage, key: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DietQaError {
    pub(crate) fn malformed(stage: Stage, key: &'static str) -> Self {
        Self::MalformedOutput { stage, key }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidInput(_) => exit_codes::INVALID_INPUT,
            Self::Http(_) | Self::ExternalService(_) => exit_codes::EXTERNAL_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
