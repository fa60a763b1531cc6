//! Host-side generator invocation
//!
//! The parent process holds the sketch as a base64-encoded PNG. The invoker
//! writes it into a private scratch directory, runs the generator with
//! `<input> <output> <style>`, and parses the generator's last output line
//! as a [`GenerationReport`].

use crate::error::InvokeError;
use crate::report::GenerationReport;
use crate::style::OutputStyle;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Scratch file name for the decoded image
pub const INPUT_FILE: &str = "input.png";

/// Runs the `generate` program on behalf of a host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorInvoker {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl GeneratorInvoker {
    /// Create invoker for `program`
    #[inline]
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// With leading arguments placed before the positional ones
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// With working directory
    #[inline]
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program path
    #[inline]
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Generate from an in-memory image
    ///
    /// The decoded image lives in a scratch directory removed when the call
    /// returns; artifacts are written to `output_dir`, which is kept.
    ///
    /// # Errors
    /// - [`InvokeError::Decode`] if `image_base64` is not valid base64
    /// - [`InvokeError::Io`] if the scratch directory cannot be prepared
    /// - [`InvokeError::GeneratorFailed`] if the generator exits unsuccessfully
    /// - [`InvokeError::EmptyOutput`] / [`InvokeError::InvalidReport`] if no report is printed
    pub async fn generate_from_base64(
        &self,
        image_base64: &str,
        style: OutputStyle,
        output_dir: &Path,
    ) -> Result<GenerationReport, InvokeError> {
        let image = STANDARD.decode(image_base64.trim())?;

        let scratch = tempfile::Builder::new()
            .prefix("rishah-ai-")
            .tempdir()
            .map_err(|source| InvokeError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let input = scratch.path().join(INPUT_FILE);
        tokio::fs::write(&input, &image)
            .await
            .map_err(|source| InvokeError::Io {
                path: input.clone(),
                source,
            })?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| InvokeError::Io {
                path: output_dir.to_path_buf(),
                source,
            })?;

        self.run(&input, output_dir, style).await
    }

    /// Run the generator on an image already on disk
    ///
    /// # Errors
    /// Same as [`generate_from_base64`](Self::generate_from_base64), minus decoding
    pub async fn run(
        &self,
        input: &Path,
        output_dir: &Path,
        style: OutputStyle,
    ) -> Result<GenerationReport, InvokeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(input)
            .arg(output_dir)
            .arg(style.as_str())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        info!(program = %self.program.display(), style = %style, "running generator");
        let output = cmd.output().await.map_err(|source| InvokeError::Io {
            path: self.program.clone(),
            source,
        })?;
        debug!(status = ?output.status, "generator exited");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            let line = last_line(&stdout).ok_or(InvokeError::EmptyOutput)?;
            parse_report(line)
        } else {
            let message = last_line(&stderr)
                .and_then(|line| parse_report(line).ok())
                .and_then(|report| match report {
                    GenerationReport::Failure(f) => Some(f.error),
                    _ => None,
                })
                .unwrap_or_else(|| format!("generator exited with {}", output.status));
            Err(InvokeError::GeneratorFailed(message))
        }
    }
}

/// Last non-empty line of `text`
#[must_use]
pub fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// Parse one report line
///
/// # Errors
/// Returns [`InvokeError::InvalidReport`] if the line is not a report
pub fn parse_report(line: &str) -> Result<GenerationReport, InvokeError> {
    serde_json::from_str(line).map_err(|source| InvokeError::InvalidReport {
        line: line.to_string(),
        source,
    })
}

/// Find the generator next to the executable, falling back to the working
/// directory
///
/// # Errors
/// Returns [`InvokeError::GeneratorNotFound`] listing every path tried
pub fn locate_generator(exe_dir: &Path, cwd: &Path, name: &str) -> Result<PathBuf, InvokeError> {
    let candidates = [exe_dir.join(name), cwd.join(name)];
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| InvokeError::GeneratorNotFound {
            searched: candidates.to_vec(),
        })
}
