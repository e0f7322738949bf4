//! Player character motion.
//!
//! The character is a scene node that turns about the vertical axis and walks
//! along its own facing direction, never along world axes.

use ecosort_common::{NodeId, WorldError};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::IntentState;
use crate::world::SpatialWorld;

/// Default walking speed in world units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 120.0;

/// Default turning speed in radians per second.
pub const DEFAULT_ROTATION_SPEED: f32 = 2.0;

/// Tunables for character motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// World units per second at full forward intent
    pub move_speed: f32,
    /// Radians per second at full turn intent
    pub rotation_speed: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            rotation_speed: DEFAULT_ROTATION_SPEED,
        }
    }
}

/// The player character: a root node plus its yaw.
#[derive(Debug, Clone)]
pub struct Player {
    /// Character root node
    node: NodeId,
    /// Rotation about +Y in radians
    yaw: f32,
}

impl Player {
    /// Wraps an existing character root node facing +Z.
    #[must_use]
    pub const fn new(node: NodeId) -> Self {
        Self { node, yaw: 0.0 }
    }

    /// Character root node.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Current yaw in radians.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Unit vector the character is facing.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::Z
    }

    /// World position of the character root.
    #[must_use]
    pub fn position<W: SpatialWorld + ?Sized>(&self, world: &W) -> Option<Vec3> {
        world.world_position(self.node)
    }

    /// Attachment anchor for carried items: the first descendant whose name
    /// contains `anchor_name`, else the character root.
    #[must_use]
    pub fn anchor<W: SpatialWorld + ?Sized>(&self, world: &W, anchor_name: &str) -> NodeId {
        world.find_descendant(self.node, anchor_name).unwrap_or_else(|| {
            debug!(anchor_name, "No anchor bone found, using character root");
            self.node
        })
    }

    /// Integrates one tick of turning and walking.
    ///
    /// Turning is applied first so the step is taken along the new heading.
    pub fn integrate<W: SpatialWorld + ?Sized>(
        &mut self,
        world: &mut W,
        intent: &IntentState,
        motion: &MotionConfig,
        delta: f32,
    ) -> Result<(), WorldError> {
        let mut transform = world
            .local_transform(self.node)
            .ok_or(WorldError::NodeNotFound(self.node))?;

        self.yaw -= intent.turn * motion.rotation_speed * delta;
        let step = self.forward() * (intent.forward * motion.move_speed * delta);

        transform.rotation = Quat::from_rotation_y(self.yaw);
        transform.translation += step;
        world.set_local_transform(self.node, transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use crate::world::Transform;
    use std::f32::consts::FRAC_PI_2;

    fn setup() -> (SceneGraph, Player) {
        let mut scene = SceneGraph::new();
        let node = scene.spawn_at_root("character", Transform::IDENTITY).expect("character");
        (scene, Player::new(node))
    }

    #[test]
    fn test_forward_walks_along_facing() {
        let (mut scene, mut player) = setup();
        let intent = IntentState { forward: 1.0, turn: 0.0 };
        let motion = MotionConfig { move_speed: 10.0, rotation_speed: 1.0 };

        player.integrate(&mut scene, &intent, &motion, 0.5).expect("integrate");

        let pos = player.position(&scene).expect("position");
        assert!((pos - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn test_turn_then_walk_follows_new_heading() {
        let (mut scene, mut player) = setup();
        let motion = MotionConfig { move_speed: 10.0, rotation_speed: FRAC_PI_2 };

        // Turning left for one second rotates yaw by +90 degrees.
        player
            .integrate(&mut scene, &IntentState { forward: 0.0, turn: -1.0 }, &motion, 1.0)
            .expect("turn");
        assert!((player.yaw() - FRAC_PI_2).abs() < 1e-5);

        player
            .integrate(&mut scene, &IntentState { forward: 1.0, turn: 0.0 }, &motion, 1.0)
            .expect("walk");
        let pos = player.position(&scene).expect("position");
        assert!((pos - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_anchor_falls_back_to_root() {
        let (mut scene, player) = setup();
        assert_eq!(player.anchor(&scene, "hand"), player.node());

        let hand = scene.spawn("RightHand", player.node(), Transform::IDENTITY).expect("hand");
        assert_eq!(player.anchor(&scene, "hand"), hand);
    }
}
