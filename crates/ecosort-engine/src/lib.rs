//! # EcoSort Engine
//!
//! Runs EcoSort headless: loads configuration and assets, replays input and
//! drives the gameplay session frame by frame.
//!
//! This crate ties together:
//! - Configuration: TOML engine and gameplay settings
//! - Assets: RON manifest and models loaded on a tokio runtime
//! - Audio: sound cue files behind the gameplay feedback sink
//! - Input: scripted replay and a queue for live key edges
//! - Timing: wall-clock and fixed-step frame scheduling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod asset_loader;
pub mod audio;
pub mod config;
pub mod script;
pub mod timing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::app::*;
    pub use crate::asset_loader::*;
    pub use crate::audio::*;
    pub use crate::config::*;
    pub use crate::script::*;
    pub use crate::timing::*;
}

pub use prelude::*;
