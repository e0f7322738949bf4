//! Sound cue feedback.
//!
//! The gameplay core only decides *which* cue to play. Playback is owned by
//! an external [`FeedbackSink`]; a failing sink is logged and otherwise
//! ignored so audio problems never block a pickup or a deposit.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Discrete sound cues emitted by the interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// An item was picked up
    Pickup,
    /// An item went into the matching bin
    Correct,
    /// An item went into the wrong bin
    Incorrect,
}

impl SoundCue {
    /// All cues.
    pub const ALL: [Self; 3] = [Self::Pickup, Self::Correct, Self::Incorrect];

    /// Asset name used to look up the cue's audio file.
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

/// Errors a feedback sink may report.
#[derive(Debug, Clone, Error)]
pub enum FeedbackError {
    /// No audio registered for the cue
    #[error("no sound registered for cue {0:?}")]
    MissingCue(SoundCue),

    /// The output device refused playback
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Plays sound cues. Fire-and-forget.
pub trait FeedbackSink {
    /// Starts playing a cue.
    fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError>;
}

/// Sink that drops every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl FeedbackSink for SilentFeedback {
    fn play(&mut self, _cue: SoundCue) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// Sink that records cues in order; useful for tests and replays.
#[derive(Debug, Default, Clone)]
pub struct RecordingFeedback {
    played: Vec<SoundCue>,
}

impl RecordingFeedback {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far.
    #[must_use]
    pub fn played(&self) -> &[SoundCue] {
        &self.played
    }
}

impl FeedbackSink for RecordingFeedback {
    fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
        self.played.push(cue);
        Ok(())
    }
}

/// Plays a cue, logging instead of propagating failures.
pub fn play_cue(sink: &mut dyn FeedbackSink, cue: SoundCue) {
    if let Err(e) = sink.play(cue) {
        warn!(?cue, error = %e, "Sound cue failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl FeedbackSink for BrokenSink {
        fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
            Err(FeedbackError::MissingCue(cue))
        }
    }

    #[test]
    fn test_play_cue_swallows_errors() {
        let mut sink = BrokenSink;
        play_cue(&mut sink, SoundCue::Correct);
    }

    #[test]
    fn test_recording_feedback_keeps_order() {
        let mut sink = RecordingFeedback::new();
        play_cue(&mut sink, SoundCue::Pickup);
        play_cue(&mut sink, SoundCue::Incorrect);
        assert_eq!(sink.played(), &[SoundCue::Pickup, SoundCue::Incorrect]);
    }
}
