//! Rishah Core - sketch-to-artifact generation
//!
//! Turns a hand-drawn sketch image into styled artifacts by delegating the
//! work to an external AI session:
//! - Maps an output style to a natural-language instruction
//! - Drives one session per request through the [`SessionFactory`] seam
//! - Discovers what the session wrote and classifies it
//! - Renders the single-line JSON report the host process parses
//!
//! # Example
//!
//! ```rust,ignore
//! use rishah_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GenerateConfig::new();
//! let factory = Arc::new(CommandSessionFactory::new(config.backend.clone()));
//! let acquisition = ArtifactAcquisition::new(factory)
//!     .with_session_config(config.session_config())
//!     .with_timeout(config.timeout());
//!
//! let request = GenerationRequest::new(
//!     Some("sketch.png".into()),
//!     Some("out".into()),
//!     OutputStyle::Svg,
//! )?;
//! let result = acquisition.acquire(&request).await?;
//! println!("{}", GenerationReport::from_result(&result).to_json_line());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod invoker;
pub mod report;
pub mod session;
pub mod style;

// Re-exports for convenience
pub use acquisition::{build_prompt, ArtifactAcquisition, GenerationRequest, GenerationResult};
pub use config::{BackendConfig, GenerateConfig};
pub use error::{AcquireError, ConfigError, InvokeError, SessionError, USAGE};
pub use invoker::{locate_generator, GeneratorInvoker};
pub use report::{FailureReport, GenerationReport, MultiReport, SingleReport};
pub use session::{
    CommandSession, CommandSessionFactory, EventHandler, Session, SessionConfig, SessionEvent,
    SessionFactory, SessionId, SYSTEM_DIRECTIVE,
};
pub use style::{CollectMode, OutputStyle, StyleInstruction};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Rishah Core
    pub use crate::{
        AcquireError, ArtifactAcquisition, CollectMode, CommandSessionFactory, GenerateConfig,
        GenerationReport, GenerationRequest, GenerationResult, OutputStyle, Session,
        SessionConfig, SessionEvent, SessionFactory,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
