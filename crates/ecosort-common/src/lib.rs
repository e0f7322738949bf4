//! # EcoSort Common
//!
//! Common types, utilities, and shared abstractions for EcoSort.
//!
//! This crate provides foundational types used across all EcoSort crates:
//! - ID types (EntityId, NodeId)
//! - Waste categories shared by trash items and bins
//! - Version information for data files
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod category;
pub mod error;
pub mod ids;
pub mod version;

/// Math types used by every crate (re-exported so versions stay aligned).
pub use glam;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::category::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
    pub use glam::{Mat4, Quat, Vec3};
}

pub use prelude::*;
