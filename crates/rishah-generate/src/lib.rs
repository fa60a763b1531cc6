//! Rishah Generate - the `generate` command
//!
//! Parses arguments, loads configuration and runs one acquisition, turning
//! every outcome into a single JSON report line.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;

pub use cli::{emit, progress_handler, run, unexpected, Args};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
