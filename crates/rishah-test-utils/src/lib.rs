//! Testing utilities for the Rishah workspace
//!
//! A scripted [`SessionFactory`] that writes fixture files instead of
//! calling a real assistant, plus fixture helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use rishah_core::{EventHandler, Session, SessionConfig, SessionError, SessionEvent, SessionFactory, SessionId};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Line of the prompt naming the output directory
const OUTPUT_DIR_PREFIX: &str = "The output directory is: ";

/// PNG file signature, enough for a source image fixture
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// What a fake session does when prompted
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    pub files: Vec<(String, String)>,
    pub events: Vec<SessionEvent>,
    pub fail_create: bool,
    pub fail_send: bool,
    pub fail_destroy: bool,
    pub delay: Option<Duration>,
}

/// Lifecycle observations shared between the factory, its sessions and
/// the test
#[derive(Debug, Clone, Default)]
pub struct SessionCounters {
    created: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl SessionCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// Scripted session factory
#[derive(Debug, Clone, Default)]
pub struct FakeSessionFactory {
    script: FakeScript,
    counters: SessionCounters,
}

impl FakeSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session writes `name` with `content` into the output directory
    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.script.files.push((name.to_string(), content.to_string()));
        self
    }

    /// Session emits `event` while waiting
    pub fn with_event(mut self, event: SessionEvent) -> Self {
        self.script.events.push(event);
        self
    }

    /// Session announces a tool invocation
    pub fn with_tool(self, tool_name: &str) -> Self {
        self.with_event(SessionEvent::ToolExecutionStart {
            tool_name: tool_name.to_string(),
        })
    }

    pub fn failing_create(mut self) -> Self {
        self.script.fail_create = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.script.fail_send = true;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.script.fail_destroy = true;
        self
    }

    /// Session sleeps before doing anything
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters.clone()
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn create(&self, _config: &SessionConfig) -> Result<Box<dyn Session>, SessionError> {
        if self.script.fail_create {
            return Err(SessionError::Closed);
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            id: SessionId::new(),
            script: self.script.clone(),
            counters: self.counters.clone(),
            handlers: Vec::new(),
        }))
    }

    async fn stop(&self) -> Result<(), SessionError> {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeSession {
    id: SessionId,
    script: FakeScript,
    counters: SessionCounters,
    handlers: Vec<EventHandler>,
}

#[async_trait]
impl Session for FakeSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn on_event(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    async fn send_and_wait(&mut self, prompt: &str) -> Result<(), SessionError> {
        self.counters.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }

        for event in &self.script.events {
            for handler in &self.handlers {
                handler(event);
            }
        }

        if self.script.fail_send {
            return Err(SessionError::Failed {
                status: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        let output_dir = output_dir_from_prompt(prompt).ok_or(SessionError::Closed)?;
        for (name, content) in &self.script.files {
            tokio::fs::write(output_dir.join(name), content).await?;
        }
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), SessionError> {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_destroy {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

/// Output directory named in a generation prompt
pub fn output_dir_from_prompt(prompt: &str) -> Option<PathBuf> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(OUTPUT_DIR_PREFIX))
        .map(PathBuf::from)
}

/// Write a source image fixture into `dir`
pub fn write_source_image(dir: &Path) -> PathBuf {
    let path = dir.join("sketch.png");
    std::fs::write(&path, PNG_SIGNATURE).unwrap();
    path
}

/// Temporary workspace holding a source image and an (uncreated) output
/// directory
pub fn setup_dirs() -> (TempDir, PathBuf, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let source = write_source_image(root.path());
    let output = root.path().join("out");
    (root, source, output)
}
