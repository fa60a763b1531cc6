//! Error types for Rishah Core
//!
//! Provides error handling for:
//! - Request validation (missing arguments, missing source image)
//! - Output directory and artifact I/O
//! - External session failures and timeouts
//! - Host-side generator invocation
//! - Configuration loading

use std::path::PathBuf;

/// Usage line reported for missing arguments
pub const USAGE: &str = "Usage: generate <input-image-path> <output-dir> [style]";

/// Main acquisition error type
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// Required argument absent or empty
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Source image does not exist
    #[error("input image not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Filesystem failure (not retried)
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact record could not be built
    #[error("artifact error: {0}")]
    Artifact(#[from] rishah_artifact::ArtifactError),

    /// External session failed
    #[error("session failed: {0}")]
    Session(#[from] SessionError),

    /// Session did not complete in time
    #[error("session timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },
}

impl AcquireError {
    /// Wrap an I/O error with the path it concerns
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was raised before any session was started
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound(_))
    }

    /// Message placed in the JSON error object
    #[must_use]
    pub fn report_message(&self) -> String {
        match self {
            Self::InvalidInput(_) => USAGE.to_string(),
            Self::NotFound(path) => format!("Input image not found: {}", path.display()),
            other => format!("Failed to generate image: {other}"),
        }
    }
}

/// Errors surfaced by an external generation session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Backend process could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Communication with the backend failed
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Backend reported failure
    #[error("backend exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    /// Session already torn down or stream unavailable
    #[error("session closed")]
    Closed,
}

/// Host-side generator invocation errors
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// Image payload is not valid base64
    #[error("failed to decode image data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Scratch directory or file I/O failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generator program not found in any candidate location
    #[error("generator not found, looked in: {searched:?}")]
    GeneratorNotFound { searched: Vec<PathBuf> },

    /// Generator exited unsuccessfully
    #[error("generation failed: {0}")]
    GeneratorFailed(String),

    /// Generator printed nothing
    #[error("no output from generator")]
    EmptyOutput,

    /// Last output line is not a report
    #[error("invalid report line {line:?}: {source}")]
    InvalidReport {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
