//! Generator configuration
//!
//! Loaded from an optional TOML file; every field has a default so a
//! partial file (or none at all) is valid. Command-line flags are applied on
//! top with the `with_*` builders.
//!
//! ```toml
//! model = "gpt-4.1"
//! log_level = "error"
//! timeout_secs = 600
//!
//! [backend]
//! program = "copilot"
//! args = ["--model", "{model}", "--allow-all-tools", "--prompt", "{prompt}"]
//! ```

use crate::error::ConfigError;
use crate::session::{SessionConfig, SYSTEM_DIRECTIVE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced with the model name
pub const MODEL_PLACEHOLDER: &str = "{model}";
/// Placeholder replaced with the log level
pub const LOG_LEVEL_PLACEHOLDER: &str = "{log_level}";
/// Placeholder replaced with the full prompt
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Top-level generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Model requested from the backend
    pub model: String,
    /// Backend log verbosity
    pub log_level: String,
    /// Session wait limit in seconds (0 waits forever)
    pub timeout_secs: u64,
    /// Replacement for the built-in role directive
    pub system_message: Option<String>,
    /// External assistant process
    pub backend: BackendConfig,
}

impl GenerateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid for this schema
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With backend program
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.backend.program = program.into();
        self
    }

    /// Session wait limit, `None` when disabled
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Parameters for opening a session
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            model: self.model.clone(),
            system_message: self
                .system_message
                .clone()
                .unwrap_or_else(|| SYSTEM_DIRECTIVE.to_string()),
            log_level: self.log_level.clone(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            log_level: "error".to_string(),
            timeout_secs: 600,
            system_message: None,
            backend: BackendConfig::default(),
        }
    }
}

/// External assistant process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Program to run
    pub program: String,
    /// Argument templates
    ///
    /// `{model}`, `{log_level}` and `{prompt}` are substituted. Without a
    /// `{prompt}` argument the prompt is written to stdin.
    pub args: Vec<String>,
    /// Working directory for the process
    pub working_dir: Option<PathBuf>,
}

impl BackendConfig {
    /// Create a backend running `program` with `args`
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    /// Whether the prompt travels as an argument rather than on stdin
    #[inline]
    #[must_use]
    pub fn prompt_in_args(&self) -> bool {
        self.args.iter().any(|a| a.contains(PROMPT_PLACEHOLDER))
    }

    /// Substitute placeholders in the argument templates
    #[must_use]
    pub fn render_args(&self, session: &SessionConfig, prompt: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(MODEL_PLACEHOLDER, &session.model)
                    .replace(LOG_LEVEL_PLACEHOLDER, &session.log_level)
                    .replace(PROMPT_PLACEHOLDER, prompt)
            })
            .collect()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(
            "copilot",
            [
                "--model",
                MODEL_PLACEHOLDER,
                "--log-level",
                LOG_LEVEL_PLACEHOLDER,
                "--allow-all-tools",
                "--prompt",
                PROMPT_PLACEHOLDER,
            ],
        )
    }
}
