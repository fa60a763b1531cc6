//! Subprocess session backend
//!
//! Runs an external assistant CLI once per session. Each stdout line is
//! turned into a [`SessionEvent`]; a zero exit status is completion.

use super::{EventHandler, Session, SessionConfig, SessionEvent, SessionFactory, SessionId};
use crate::config::BackendConfig;
use crate::error::SessionError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Bytes of stderr kept for failure reports
const STDERR_TAIL: usize = 2048;

/// Factory spawning one backend process per session
#[derive(Debug, Clone)]
pub struct CommandSessionFactory {
    backend: BackendConfig,
}

impl CommandSessionFactory {
    /// Create factory for the given backend
    #[inline]
    #[must_use]
    pub fn new(backend: BackendConfig) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SessionFactory for CommandSessionFactory {
    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn Session>, SessionError> {
        let session = CommandSession::new(self.backend.clone(), config.clone());
        debug!(session = %session.id, program = %self.backend.program, "session created");
        Ok(Box::new(session))
    }

    async fn stop(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// A single backend process
pub struct CommandSession {
    id: SessionId,
    backend: BackendConfig,
    config: SessionConfig,
    handlers: Vec<EventHandler>,
    child: Option<Child>,
}

impl std::fmt::Debug for CommandSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSession")
            .field("id", &self.id)
            .field("program", &self.backend.program)
            .field("handlers", &self.handlers.len())
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl CommandSession {
    /// Create an idle session
    #[must_use]
    pub fn new(backend: BackendConfig, config: SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            config,
            handlers: Vec::new(),
            child: None,
        }
    }

    fn command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.backend.program);
        cmd.args(self.backend.render_args(&self.config, prompt))
            .stdin(if self.backend.prompt_in_args() {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.backend.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl Session for CommandSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn on_event(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    async fn send_and_wait(&mut self, prompt: &str) -> Result<(), SessionError> {
        if self.child.is_some() {
            return Err(SessionError::Closed);
        }

        // The backend has no separate channel for the role directive.
        let full_prompt = format!("{}\n\n{}", self.config.system_message, prompt);

        let mut child = self
            .command(&full_prompt)
            .spawn()
            .map_err(|source| SessionError::Spawn {
                program: self.backend.program.clone(),
                source,
            })?;
        debug!(session = %self.id, pid = ?child.id(), "backend started");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(SessionError::Closed)?;
        let mut stderr = child.stderr.take().ok_or(SessionError::Closed)?;

        let id = self.id;
        let child = self.child.insert(child);
        let handlers = &self.handlers;
        let prompt_bytes = full_prompt.as_bytes();

        // The prompt is written while both output streams drain, so a
        // backend that talks before it reads cannot stall on a full pipe.
        let write_prompt = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            let written = async {
                stdin.write_all(prompt_bytes).await?;
                stdin.shutdown().await
            }
            .await;
            match written {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(session = %id, "backend closed stdin before reading the prompt");
                    Ok(())
                }
                other => other,
            }
        };
        let read_events = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                let event = SessionEvent::from_line(&line);
                for handler in handlers {
                    handler(&event);
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let read_stderr = async {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await.map(|_| buf)
        };

        let (written, events, stderr_text) = tokio::join!(write_prompt, read_events, read_stderr);
        written?;
        events?;
        let stderr_text = stderr_text.unwrap_or_default();

        let status = child.wait().await?;
        self.child = None;

        if status.success() {
            debug!(session = %self.id, "backend completed");
            Ok(())
        } else {
            Err(SessionError::Failed {
                status: status.code(),
                stderr: tail(&stderr_text, STDERR_TAIL),
            })
        }
    }

    async fn destroy(&mut self) -> Result<(), SessionError> {
        if let Some(mut child) = self.child.take() {
            warn!(session = %self.id, "killing backend still running at teardown");
            child.kill().await?;
        }
        debug!(session = %self.id, "session destroyed");
        Ok(())
    }
}

/// Last `max` bytes of `text`, on a char boundary
fn tail(text: &str, max: usize) -> String {
    let text = text.trim_end();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
