//! `generate` - sketch image to styled artifacts
//!
//! stdout carries exactly one JSON line on success; failures print the JSON
//! error object on stderr and exit with status 1.

use clap::error::ErrorKind;
use clap::Parser;
use rishah_core::{CommandSessionFactory, GenerationReport, USAGE};
use rishah_generate::{emit, run, unexpected, Args};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rishah=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            debug!(error = %e, "argument parsing failed");
            std::process::exit(emit(&GenerationReport::failure(USAGE)));
        }
    };

    let report = match args.load_config() {
        Ok(config) => {
            let factory = Arc::new(CommandSessionFactory::new(config.backend.clone()));
            run(&args, &config, factory).await
        }
        Err(e) => unexpected(&e),
    };

    std::process::exit(emit(&report));
}
