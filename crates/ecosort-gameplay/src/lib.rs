//! # EcoSort Gameplay
//!
//! Game logic for EcoSort, a third-person trash sorting game.
//!
//! This crate provides everything that decides what happens, independent of
//! rendering, audio and asset IO:
//! - Spatial world adapter and an in-memory scene graph
//! - Entity registry for floor trash and bins
//! - Nearest-within-radius proximity queries
//! - Pickup and deposit state machine
//! - Score and win/lose evaluation
//! - Input intents, character motion, follow camera and walk clip
//! - HUD state and the event bus
//! - Game session wiring it all together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod animation;
pub mod camera;
pub mod entity;
pub mod events;
pub mod feedback;
pub mod hud;
pub mod input;
pub mod interaction;
pub mod player;
pub mod progress;
pub mod proximity;
pub mod scene;
pub mod session;
pub mod simulation;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::animation::*;
    pub use crate::camera::*;
    pub use crate::entity::*;
    pub use crate::events::*;
    pub use crate::feedback::*;
    pub use crate::hud::*;
    pub use crate::input::*;
    pub use crate::interaction::*;
    pub use crate::player::*;
    pub use crate::progress::*;
    pub use crate::proximity::*;
    pub use crate::scene::*;
    pub use crate::session::*;
    pub use crate::simulation::*;
    pub use crate::world::*;
}

pub use prelude::*;
