//! Rishah Artifact Model
//!
//! Records for the files a generation session leaves in its output
//! directory.
//!
//! # Core Concepts
//!
//! - [`Artifact`]: one generated file, with content or as a path reference
//! - [`is_vector_graphic`]: name- and content-based SVG detection
//!
//! # Example
//!
//! ```rust,ignore
//! use rishah_artifact::Artifact;
//!
//! let bytes = std::fs::read("/tmp/out/generated.svg")?;
//! let artifact = Artifact::with_content("/tmp/out/generated.svg", &bytes)?;
//! assert!(artifact.is_vector());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod vector;

pub use artifact::{Artifact, ArtifactContent, ArtifactError};
pub use vector::{is_vector_graphic, VECTOR_EXTENSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
