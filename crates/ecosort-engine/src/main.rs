//! # EcoSort
//!
//! Entry point for the EcoSort trash sorting game.
//!
//! Usage: `ecosort [CONFIG] [SCRIPT]`
//! - `CONFIG`: engine configuration (TOML), defaults to the user config file
//! - `SCRIPT`: input script (RON) to replay

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use ecosort_engine::{app, EngineConfig, InputScript};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ecosort=info".parse()?))
        .init();

    info!("EcoSort starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    let script = args
        .next()
        .map(|path| InputScript::load(Path::new(&path)).with_context(|| "failed to load input script"))
        .transpose()?;

    let summary = app::run(config, script.as_ref())?;

    info!("EcoSort shutdown complete after {} frames", summary.frames);
    Ok(())
}
