//! Looping clip playback with pause gating.

use serde::{Deserialize, Serialize};

/// Intent magnitude above which the character counts as moving.
pub const MOTION_EPSILON: f32 = 0.001;

/// A looping animation clip that only advances while unpaused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopingClip {
    /// Clip name (e.g. "walk")
    name: String,
    /// Clip length in seconds
    duration: f32,
    /// Playback position in seconds, in `[0, duration)`
    time: f32,
    /// Whether playback is halted
    paused: bool,
}

impl LoopingClip {
    /// Creates a paused clip at time zero.
    #[must_use]
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(f32::EPSILON),
            time: 0.0,
            paused: true,
        }
    }

    /// Clip name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Playback position in seconds.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Whether playback is halted.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pauses or resumes playback.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advances the playback position, wrapping at the clip end.
    pub fn advance(&mut self, delta: f32) {
        if self.paused {
            return;
        }
        self.time = (self.time + delta).rem_euclid(self.duration);
    }
}

impl Default for LoopingClip {
    fn default() -> Self {
        Self::new("walk", 1.0)
    }
}
