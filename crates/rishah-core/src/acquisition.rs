//! Artifact acquisition
//!
//! Runs one generation session for a source image, then finds and
//! classifies whatever the session wrote into the output directory.
//!
//! # Workflow
//! 1. Validate the request and create the output directory
//! 2. Build the style instruction and the combined prompt
//! 3. Open a session, send the prompt, wait (bounded by the timeout)
//! 4. Tear the session down on every exit path
//! 5. Discover artifacts according to the [`CollectMode`]

use crate::error::AcquireError;
use crate::session::{EventHandler, Session, SessionConfig, SessionEvent, SessionFactory};
use crate::style::{CollectMode, OutputStyle, StyleInstruction};
use rishah_artifact::Artifact;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A single generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    source_image: PathBuf,
    output_dir: PathBuf,
    style: OutputStyle,
    collect_mode: CollectMode,
}

impl GenerationRequest {
    /// Build a request from possibly missing arguments
    ///
    /// The collect mode defaults to the style's
    /// [`default_collect_mode`](OutputStyle::default_collect_mode).
    ///
    /// # Errors
    /// Returns [`AcquireError::InvalidInput`] if either path is absent or empty
    pub fn new(
        source_image: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        style: OutputStyle,
    ) -> Result<Self, AcquireError> {
        let source_image = source_image
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| AcquireError::InvalidInput("missing input image path".into()))?;
        let output_dir = output_dir
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| AcquireError::InvalidInput("missing output directory".into()))?;

        Ok(Self {
            source_image,
            output_dir,
            style,
            collect_mode: style.default_collect_mode(),
        })
    }

    /// With collect mode
    #[inline]
    #[must_use]
    pub fn with_collect_mode(mut self, mode: CollectMode) -> Self {
        self.collect_mode = mode;
        self
    }

    /// Source image path
    #[inline]
    #[must_use]
    pub fn source_image(&self) -> &Path {
        &self.source_image
    }

    /// Output directory as given
    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Requested style
    #[inline]
    #[must_use]
    pub fn style(&self) -> OutputStyle {
        self.style
    }

    /// Collect mode
    #[inline]
    #[must_use]
    pub fn collect_mode(&self) -> CollectMode {
        self.collect_mode
    }
}

/// Outcome of a completed acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Discovered artifacts, in discovery order
    pub artifacts: Vec<Artifact>,
    /// Output directory as given in the request
    pub output_dir: PathBuf,
    /// Style that was requested
    pub requested_style: OutputStyle,
    /// Style actually produced (differs after the mermaid→svg fallback)
    pub effective_style: OutputStyle,
    /// How artifacts were collected
    pub collect_mode: CollectMode,
}

impl GenerationResult {
    /// The artifact reported in single-artifact mode
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<&Artifact> {
        self.artifacts.first()
    }

    /// Whether the session produced nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Paths of all artifacts
    #[must_use]
    pub fn files(&self) -> Vec<&Path> {
        self.artifacts.iter().map(Artifact::path).collect()
    }
}

/// Drives one session per request and harvests its output
#[derive(Clone)]
pub struct ArtifactAcquisition {
    factory: Arc<dyn SessionFactory>,
    session_config: SessionConfig,
    timeout: Option<Duration>,
    progress: Option<EventHandler>,
}

impl std::fmt::Debug for ArtifactAcquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactAcquisition")
            .field("session_config", &self.session_config)
            .field("timeout", &self.timeout)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl ArtifactAcquisition {
    /// Create acquisition over the given session factory
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            session_config: SessionConfig::default(),
            timeout: None,
            progress: None,
        }
    }

    /// With session parameters
    #[inline]
    #[must_use]
    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// With a limit on the session wait
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// With a progress observer for session events
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, handler: EventHandler) -> Self {
        self.progress = Some(handler);
        self
    }

    /// Run the session for `request` and collect its artifacts
    ///
    /// An empty output directory after completion is a successful, empty
    /// result.
    ///
    /// # Errors
    /// - [`AcquireError::NotFound`] if the source image is missing (no session is opened)
    /// - [`AcquireError::Io`] if the output directory cannot be created or read
    /// - [`AcquireError::Session`] / [`AcquireError::Timeout`] if the session fails
    pub async fn acquire(&self, request: &GenerationRequest) -> Result<GenerationResult, AcquireError> {
        let source = request.source_image();
        let exists = tokio::fs::try_exists(source)
            .await
            .map_err(|e| AcquireError::io(source, e))?;
        if !exists {
            return Err(AcquireError::NotFound(source.to_path_buf()));
        }

        let output_dir = request.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| AcquireError::io(output_dir, e))?;
        let absolute_dir = std::path::absolute(output_dir).map_err(|e| AcquireError::io(output_dir, e))?;

        let instruction = StyleInstruction::for_style(request.style(), &absolute_dir);
        let prompt = build_prompt(source, &instruction, &absolute_dir);

        info!(
            style = %request.style(),
            output_dir = %absolute_dir.display(),
            "starting generation session"
        );
        self.run_session(&prompt).await?;

        let result = match request.collect_mode() {
            CollectMode::ContentRead => read_primary(request, &instruction).await?,
            CollectMode::ListOnly => list_artifacts(request).await?,
        };

        info!(
            artifacts = result.artifacts.len(),
            effective_style = %result.effective_style,
            "generation complete"
        );
        Ok(result)
    }

    async fn run_session(&self, prompt: &str) -> Result<(), AcquireError> {
        let mut session = match self.factory.create(&self.session_config).await {
            Ok(session) => session,
            Err(e) => {
                self.stop_client().await;
                return Err(e.into());
            }
        };
        debug!(session = %session.id(), "session open");
        session.on_event(self.event_handler());

        match self.send(session.as_mut(), prompt).await {
            Ok(()) => {
                if let Err(e) = session.destroy().await {
                    self.stop_client().await;
                    return Err(e.into());
                }
                self.factory.stop().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(destroy_err) = session.destroy().await {
                    warn!(error = %destroy_err, "session teardown failed");
                }
                self.stop_client().await;
                Err(e)
            }
        }
    }

    async fn send(&self, session: &mut dyn Session, prompt: &str) -> Result<(), AcquireError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, session.send_and_wait(prompt))
                .await
                .map_err(|_| AcquireError::Timeout {
                    duration_secs: limit.as_secs(),
                })?
                .map_err(AcquireError::from),
            None => session.send_and_wait(prompt).await.map_err(AcquireError::from),
        }
    }

    async fn stop_client(&self) {
        if let Err(e) = self.factory.stop().await {
            warn!(error = %e, "client stop failed");
        }
    }

    fn event_handler(&self) -> EventHandler {
        let progress = self.progress.clone();
        Arc::new(move |event: &SessionEvent| {
            if let SessionEvent::ToolExecutionStart { tool_name } = event {
                debug!(tool = %tool_name, "tool execution started");
            }
            if let Some(progress) = &progress {
                progress(event);
            }
        })
    }
}

/// Combined prompt sent to the session
#[must_use]
pub fn build_prompt(source_image: &Path, instruction: &StyleInstruction, output_dir: &Path) -> String {
    format!(
        "I have a sketch/diagram image at \"{}\".\n\n\
         Please analyze this image and {}\n\n\
         The output directory is: {}\n\n\
         After generating the files, list all the files you created with their full paths.",
        source_image.display(),
        instruction.text,
        output_dir.display()
    )
}

/// Regular files in `dir`, sorted by name
///
/// Directories and hidden files (`.DS_Store` and the like) are skipped;
/// symlinks count if they resolve to a file.
async fn list_file_names(dir: &Path) -> Result<Vec<String>, AcquireError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AcquireError::io(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| AcquireError::io(dir, e))? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => names.push(name),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }
    names.sort();
    Ok(names)
}

async fn read_artifact(path: PathBuf) -> Result<Artifact, AcquireError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AcquireError::io(&path, e))?;
    Ok(Artifact::with_content(path, &bytes)?)
}

/// Pick one artifact: canonical name, then the style fallback, then the
/// first listed file
async fn read_primary(
    request: &GenerationRequest,
    instruction: &StyleInstruction,
) -> Result<GenerationResult, AcquireError> {
    let dir = request.output_dir();
    let names = list_file_names(dir).await?;
    let style = request.style();

    let canonical = instruction
        .expected_files
        .iter()
        .find(|expected| names.iter().any(|n| n == *expected))
        .map(|name| (name.to_string(), style));

    let fallback = || {
        style
            .fallback_file()
            .filter(|fallback| names.iter().any(|n| n == fallback))
            .map(|name| (name.to_string(), OutputStyle::Svg))
    };

    let first = || names.first().map(|name| (name.clone(), style));

    let (artifacts, effective_style) = match canonical.or_else(fallback).or_else(first) {
        Some((name, effective)) => {
            debug!(file = %name, "reading artifact");
            (vec![read_artifact(dir.join(name)).await?], effective)
        }
        None => {
            info!("session produced no files");
            (Vec::new(), style)
        }
    };

    Ok(GenerationResult {
        artifacts,
        output_dir: dir.to_path_buf(),
        requested_style: style,
        effective_style,
        collect_mode: CollectMode::ContentRead,
    })
}

async fn list_artifacts(request: &GenerationRequest) -> Result<GenerationResult, AcquireError> {
    let dir = request.output_dir();
    let artifacts = list_file_names(dir)
        .await?
        .into_iter()
        .map(|name| Artifact::reference(dir.join(name)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GenerationResult {
        artifacts,
        output_dir: dir.to_path_buf(),
        requested_style: request.style(),
        effective_style: request.style(),
        collect_mode: CollectMode::ListOnly,
    })
}
