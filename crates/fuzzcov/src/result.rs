//! Result and error types for fuzzcov.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for fuzzcov operations
pub type FuzzcovResult<T> = Result<T, FuzzcovError>;

/// Errors that can occur while aggregating, rendering or gating
#[derive(Debug, Error)]
pub enum FuzzcovError {
    /// A single artifact could not be parsed.
    ///
    /// Contained within the merge step: the artifact is skipped.
    #[error("Unparsable artifact {}: {message}", path.display())]
    UnparsableArtifact {
        /// Artifact path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// No coverage profile of the project could be parsed
    #[error("No coverage data for project {project}: {parsed} of {discovered} profiles usable")]
    NoCoverageData {
        /// Project name
        project: String,
        /// Number of artifacts discovered
        discovered: usize,
        /// Number of artifacts parsed
        parsed: usize,
    },

    /// Profiling artifacts exist but none could be parsed
    #[error("No profiling data for project {project}: all {discovered} samples unusable")]
    NoProfilingData {
        /// Project name
        project: String,
        /// Number of artifacts discovered
        discovered: usize,
    },

    /// Report rendering failed
    #[error("Report rendering failed: {message}")]
    Render {
        /// Error message
        message: String,
    },

    /// The navigation patcher refused to touch the document
    #[error("Navigation patch refused: {message}")]
    PatchRefused {
        /// Error message
        message: String,
    },

    /// Build mode policy could not be loaded or is inconsistent
    #[error("Policy error: {message}")]
    Policy {
        /// Error message
        message: String,
    },

    /// Unknown instrumentation mode name
    #[error("Unknown instrumentation mode: {0}")]
    UnknownMode(String),

    /// Language with no coverage toolchain mapping
    #[error("Unsupported fuzzing language: {0}")]
    UnsupportedLanguage(String),

    /// Unknown artifact format name
    #[error("Unknown artifact format: {0}")]
    UnknownFormat(String),

    /// Profile store layout problem
    #[error("Profile store error: {message}")]
    Store {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Binary encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl FuzzcovError {
    /// Create an unparsable-artifact error
    #[must_use]
    pub fn unparsable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::UnparsableArtifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create a patch-refused error
    #[must_use]
    pub fn patch_refused(message: impl Into<String>) -> Self {
        Self::PatchRefused {
            message: message.into(),
        }
    }

    /// Create a policy error
    #[must_use]
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy {
            message: message.into(),
        }
    }

    /// Create a store error
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether the error means "nothing to report" rather than a malfunction
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(
            self,
            Self::NoCoverageData { .. } | Self::NoProfilingData { .. }
        )
    }
}
