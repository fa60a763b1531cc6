//! Command-line surface of the `generate` program

use anyhow::Context;
use clap::Parser;
use rishah_core::{
    AcquireError, ArtifactAcquisition, CollectMode, EventHandler, GenerateConfig, GenerationReport,
    GenerationRequest, OutputStyle, SessionEvent, SessionFactory,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments for `generate`
///
/// The positionals are optional so that a missing one is reported as the
/// JSON usage error rather than as clap's help text.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "generate")]
#[command(about = "Transform a sketch image into styled artifacts")]
#[command(version)]
pub struct Args {
    /// Sketch image to transform
    pub input: Option<PathBuf>,

    /// Directory receiving the generated files
    pub output: Option<PathBuf>,

    /// Output style (mermaid, description, svg, sketch, clean, detailed, all)
    pub style: Option<String>,

    /// Report every file in the output directory instead of reading one
    #[arg(long)]
    pub list_only: bool,

    /// TOML configuration file
    #[arg(long, env = "RISHAH_GENERATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session wait limit in seconds (0 waits forever)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Model requested from the assistant
    #[arg(long)]
    pub model: Option<String>,
}

impl Args {
    /// Configuration from the file (if any) with flags applied on top
    ///
    /// # Errors
    /// Returns error if the configuration file cannot be loaded
    pub fn load_config(&self) -> anyhow::Result<GenerateConfig> {
        let config = match &self.config {
            Some(path) => GenerateConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GenerateConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn apply_overrides(&self, mut config: GenerateConfig) -> GenerateConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        config
    }

    /// Requested style, `all` when absent or unrecognized
    #[must_use]
    pub fn output_style(&self) -> OutputStyle {
        OutputStyle::from_arg(self.style.as_deref())
    }

    /// Build the generation request
    ///
    /// # Errors
    /// Returns [`AcquireError::InvalidInput`] if a positional is missing
    pub fn request(&self) -> Result<GenerationRequest, AcquireError> {
        let request = GenerationRequest::new(self.input.clone(), self.output.clone(), self.output_style())?;
        Ok(if self.list_only {
            request.with_collect_mode(CollectMode::ListOnly)
        } else {
            request
        })
    }
}

/// Prints a line for every tool the session starts
#[must_use]
pub fn progress_handler() -> EventHandler {
    Arc::new(|event: &SessionEvent| {
        if let SessionEvent::ToolExecutionStart { tool_name } = event {
            eprintln!("  → Running: {tool_name}");
        }
    })
}

/// Run one generation and produce its report
pub async fn run(args: &Args, config: &GenerateConfig, factory: Arc<dyn SessionFactory>) -> GenerationReport {
    let request = match args.request() {
        Ok(request) => request,
        Err(e) => return GenerationReport::from_error(&e),
    };

    info!(
        input = %request.source_image().display(),
        style = %request.style(),
        model = %config.model,
        "generate"
    );

    let acquisition = ArtifactAcquisition::new(factory)
        .with_session_config(config.session_config())
        .with_timeout(config.timeout())
        .with_progress(progress_handler());

    match acquisition.acquire(&request).await {
        Ok(result) => GenerationReport::from_result(&result),
        Err(e) => {
            warn!(error = %e, "generation failed");
            GenerationReport::from_error(&e)
        }
    }
}

/// Failure report for an error outside the acquisition taxonomy
#[must_use]
pub fn unexpected(error: &anyhow::Error) -> GenerationReport {
    GenerationReport::failure(format!("Unexpected error: {error:#}"))
}

/// Print the report to the stream matching its outcome and return the
/// exit status
pub fn emit(report: &GenerationReport) -> i32 {
    let line = report.to_json_line();
    if report.is_success() {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
    report.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn positionals_and_flags_parse() {
        let args = Args::try_parse_from([
            "generate",
            "sketch.png",
            "out",
            "mermaid",
            "--list-only",
            "--timeout-secs",
            "30",
            "--model",
            "gpt-4o",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("sketch.png")));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.output_style(), OutputStyle::Mermaid);
        assert!(args.list_only);
        assert_eq!(args.timeout_secs, Some(30));
        assert_eq!(args.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn missing_style_defaults_to_all() {
        let args = Args::try_parse_from(["generate", "sketch.png", "out"]).unwrap();
        assert_eq!(args.output_style(), OutputStyle::All);
        assert_eq!(args.request().unwrap().collect_mode(), CollectMode::ListOnly);
    }

    #[test]
    fn missing_output_is_usage_error() {
        let args = Args::try_parse_from(["generate", "sketch.png"]).unwrap();
        let err = args.request().unwrap_err();
        assert_eq!(
            GenerationReport::from_error(&err),
            GenerationReport::failure("Usage: generate <input-image-path> <output-dir> [style]")
        );
    }

    #[test]
    fn flags_override_config() {
        let base = GenerateConfig::from_toml("model = \"from-file\"\ntimeout_secs = 5").unwrap();
        let args = Args {
            model: Some("from-flag".into()),
            ..Args::default()
        };

        let config = args.apply_overrides(base);
        assert_eq!(config.model, "from-flag");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn unexpected_error_prefix() {
        let err = anyhow::anyhow!("disk on fire").context("loading config x.toml");
        match unexpected(&err) {
            GenerationReport::Failure(f) => {
                assert_eq!(f.error, "Unexpected error: loading config x.toml: disk on fire");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
