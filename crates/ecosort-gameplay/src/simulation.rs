//! Per-frame simulation and the loop that drives it.
//!
//! Each tick, while the game is playing:
//! 1. turn the character by the turn intent
//! 2. walk along the new facing by the forward intent
//! 3. pull the follow camera toward the character
//! 4. gate the walk clip on whether any intent is active
//!
//! Once the game has ended ticks still run (rendering continues) but leave the
//! character, camera and clip untouched.
//!
//! Frames are produced by a [`TickScheduler`]; the real display clock lives in
//! the engine, tests use [`FixedDeltaScheduler`].

use ecosort_common::WorldError;
use serde::{Deserialize, Serialize};

use crate::animation::{LoopingClip, MOTION_EPSILON};
use crate::camera::FollowCamera;
use crate::input::IntentState;
use crate::player::{MotionConfig, Player};
use crate::progress::GameState;
use crate::world::SpatialWorld;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickReport {
    /// Game over; nothing moved
    Frozen,
    /// Motion was integrated
    Advanced {
        /// Whether the walk clip is playing
        walking: bool,
    },
}

/// Character motion, camera follow and walk-clip gating.
#[derive(Debug, Clone)]
pub struct Simulation {
    motion: MotionConfig,
    camera: FollowCamera,
    walk: LoopingClip,
    frames: u64,
}

impl Simulation {
    /// Creates a simulation with the given tunables.
    #[must_use]
    pub fn new(motion: MotionConfig, camera: FollowCamera, walk: LoopingClip) -> Self {
        Self {
            motion,
            camera,
            walk,
            frames: 0,
        }
    }

    /// Follow camera state.
    #[must_use]
    pub const fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    /// Mutable follow camera.
    pub fn camera_mut(&mut self) -> &mut FollowCamera {
        &mut self.camera
    }

    /// Walk clip state.
    #[must_use]
    pub const fn walk(&self) -> &LoopingClip {
        &self.walk
    }

    /// Motion tunables.
    #[must_use]
    pub const fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    /// Ticks run so far, frozen ones included.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Halts the walk clip (used when the game ends).
    pub fn pause_animation(&mut self) {
        self.walk.set_paused(true);
    }

    /// Runs one tick of `delta` seconds.
    pub fn tick<W: SpatialWorld + ?Sized>(
        &mut self,
        world: &mut W,
        player: &mut Player,
        intent: &IntentState,
        state: GameState,
        delta: f32,
    ) -> Result<TickReport, WorldError> {
        self.frames += 1;
        if state.is_terminal() {
            return Ok(TickReport::Frozen);
        }

        player.integrate(world, intent, &self.motion, delta)?;

        let target = player
            .position(&*world)
            .ok_or(WorldError::NodeNotFound(player.node()))?;
        self.camera.follow(target);

        let walking = intent.is_active(MOTION_EPSILON);
        self.walk.set_paused(!walking);
        self.walk.advance(delta);

        Ok(TickReport::Advanced { walking })
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(MotionConfig::default(), FollowCamera::default(), LoopingClip::default())
    }
}

/// Source of frame deltas. Returning `None` cancels the loop.
pub trait TickScheduler {
    /// Seconds elapsed since the previous tick, or `None` once cancelled.
    fn next_delta(&mut self) -> Option<f32>;
}

/// Deterministic scheduler producing a fixed delta a fixed number of times.
#[derive(Debug, Clone)]
pub struct FixedDeltaScheduler {
    delta: f32,
    remaining: Option<u64>,
}

impl FixedDeltaScheduler {
    /// Produces `delta` exactly `frames` times.
    #[must_use]
    pub fn new(delta: f32, frames: u64) -> Self {
        Self {
            delta,
            remaining: Some(frames),
        }
    }

    /// Produces `delta` until the frame callback stops the loop.
    #[must_use]
    pub fn unbounded(delta: f32) -> Self {
        Self {
            delta,
            remaining: None,
        }
    }
}

impl TickScheduler for FixedDeltaScheduler {
    fn next_delta(&mut self) -> Option<f32> {
        match &mut self.remaining {
            None => Some(self.delta),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.delta)
            },
        }
    }
}

/// Whether the frame loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Schedule another frame
    Continue,
    /// Stop after this frame
    Stop,
}

/// Drives `frame` once per scheduled delta until the scheduler is cancelled
/// or the callback asks to stop. Returns the number of frames run.
///
/// A frame always completes before the next delta is requested.
pub fn run_until_cancelled<S, F>(scheduler: &mut S, mut frame: F) -> u64
where
    S: TickScheduler + ?Sized,
    F: FnMut(f32) -> LoopControl,
{
    let mut frames = 0;
    while let Some(delta) = scheduler.next_delta() {
        frames += 1;
        if frame(delta) == LoopControl::Stop {
            break;
        }
    }
    frames
}
