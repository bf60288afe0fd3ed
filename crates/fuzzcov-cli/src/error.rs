//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The build command could not be started
    #[error("Build command failed to start: {message}")]
    BuildSpawn {
        /// Error message
        message: String,
    },

    /// One or more projects of a fleet pass failed
    #[error("{failed} of {total} projects failed to aggregate")]
    ProjectsFailed {
        /// Failed project count
        failed: usize,
        /// Total project count
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// fuzzcov library error
    #[error(transparent)]
    Fuzzcov(#[from] fuzzcov::FuzzcovError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a build spawn error
    #[must_use]
    pub fn build_spawn(message: impl Into<String>) -> Self {
        Self::BuildSpawn {
            message: message.into(),
        }
    }
}
