//! External generation session capability
//!
//! The AI service is an injected collaborator. Acquisition only sees the
//! [`SessionFactory`] and [`Session`] traits, so the concrete backend can be
//! a subprocess ([`CommandSessionFactory`]) or a fake that writes fixture
//! files.

mod command;

pub use command::{CommandSession, CommandSessionFactory};

use crate::error::SessionError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Role directive given to every session
pub const SYSTEM_DIRECTIVE: &str = "\
You are an expert diagram and image transformation assistant.
Your task is to analyze sketches, diagrams, and drawings and produce clean, styled output versions.

When given a diagram or sketch image:
1. Analyze the content and structure of the image
2. Generate styled output based on the requested style
3. Save all generated files to the specified output directory

Available output styles:
- \"mermaid\": If the image is a flowchart, sequence diagram, or any diagram type, generate equivalent Mermaid diagram code
- \"description\": Generate a detailed text description of the diagram/sketch
- \"svg\", \"sketch\", \"clean\", \"detailed\": Generate a self-contained SVG recreation in that visual register
- \"all\": Generate all applicable styles

Always save files to the output directory provided.
Be concise and focus on producing accurate output.";

/// Event type announcing a tool invocation
pub const TOOL_EXECUTION_START: &str = "tool.execution_start";

/// Callback receiving session events
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Session identifier (used in logs only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Model name passed to the backend
    pub model: String,
    /// Role directive
    pub system_message: String,
    /// Backend log verbosity
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            system_message: SYSTEM_DIRECTIVE.to_string(),
            log_level: "error".to_string(),
        }
    }
}

/// Notification emitted by a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session started running a tool
    ToolExecutionStart { tool_name: String },
    /// Free-form output from the session
    Message { content: String },
    /// Any other structured event
    Other { kind: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl SessionEvent {
    /// Parse one line of backend output
    ///
    /// JSON objects of the form `{"type": ..., "data": {...}}` become typed
    /// events. Anything else is a [`SessionEvent::Message`].
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        let Ok(raw) = serde_json::from_str::<RawEvent>(line) else {
            return Self::Message {
                content: line.to_string(),
            };
        };

        let field = |name: &str| raw.data.get(name).and_then(|v| v.as_str()).map(str::to_string);

        match raw.kind.as_str() {
            TOOL_EXECUTION_START => Self::ToolExecutionStart {
                tool_name: field("toolName").unwrap_or_else(|| "unknown".to_string()),
            },
            "assistant.message" => Self::Message {
                content: field("content").unwrap_or_default(),
            },
            _ => Self::Other { kind: raw.kind },
        }
    }
}

/// One conversational interaction with the generation service
#[async_trait]
pub trait Session: Send {
    /// Identifier for logging
    fn id(&self) -> SessionId;

    /// Register an observer for events emitted while waiting
    fn on_event(&mut self, handler: EventHandler);

    /// Send a prompt and wait until the session reports completion
    ///
    /// # Errors
    /// Returns error on transport failure or if the backend reports failure
    async fn send_and_wait(&mut self, prompt: &str) -> Result<(), SessionError>;

    /// Release the session's resources
    ///
    /// # Errors
    /// Returns error if teardown fails
    async fn destroy(&mut self) -> Result<(), SessionError>;
}

/// Client side of the generation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new session
    ///
    /// # Errors
    /// Returns error if the service cannot be reached
    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn Session>, SessionError>;

    /// Stop the client after the last session
    ///
    /// # Errors
    /// Returns error if shutdown fails
    async fn stop(&self) -> Result<(), SessionError>;
}
