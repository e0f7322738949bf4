//! Spatial world adapter.
//!
//! The gameplay core never touches a renderer directly. Everything it needs
//! from the scene (where a node is, how large it appears, and which parent it
//! hangs from) goes through the [`SpatialWorld`] trait.

use ecosort_common::{NodeId, WorldError};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform of a scene node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform at the given translation.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Returns a copy with the given uniform or per-axis scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Returns a copy with the given rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builds the local matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Primitive scene operations the gameplay core depends on.
pub trait SpatialWorld {
    /// World-space position of a node, if it exists.
    fn world_position(&self, node: NodeId) -> Option<Vec3>;

    /// World-space scale of a node (the product of the chain's scales).
    fn world_scale(&self, node: NodeId) -> Option<Vec3>;

    /// Local transform of a node.
    fn local_transform(&self, node: NodeId) -> Option<Transform>;

    /// Replaces the local transform of a node.
    fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), WorldError>;

    /// Re-parents `child` under `parent`, keeping the child's local transform.
    fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), WorldError>;

    /// Removes a node and its subtree from the scene.
    fn detach(&mut self, node: NodeId) -> Result<(), WorldError>;

    /// First descendant of `root` (depth-first) whose name contains `needle`,
    /// compared case-insensitively.
    fn find_descendant(&self, root: NodeId, needle: &str) -> Option<NodeId>;
}

/// Local scale that makes a node keep `desired_world_scale` once it is
/// parented under a node whose world scale is `parent_world_scale`.
///
/// Degenerate parent axes (zero scale) leave that axis at the desired value.
#[must_use]
pub fn compensated_local_scale(desired_world_scale: Vec3, parent_world_scale: Vec3) -> Vec3 {
    let axis = |desired: f32, parent: f32| {
        if parent.abs() < f32::EPSILON {
            desired
        } else {
            desired / parent
        }
    };

    Vec3::new(
        axis(desired_world_scale.x, parent_world_scale.x),
        axis(desired_world_scale.y, parent_world_scale.y),
        axis(desired_world_scale.z, parent_world_scale.z),
    )
}
