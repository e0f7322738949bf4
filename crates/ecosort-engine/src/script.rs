//! Scripted input replay.
//!
//! Headless runs are driven by an [`InputScript`]: key edges and restarts
//! tagged with the frame they fire on. Scripts are RON files:
//!
//! ```ron
//! (
//!     name: "walk and pick up",
//!     inputs: [
//!         (frame: 0, event: KeyDown("W")),
//!         (frame: 30, event: KeyUp("W")),
//!         (frame: 31, event: KeyDown("E")),
//!     ],
//! )
//! ```

use std::path::{Path, PathBuf};

use ecosort_common::{EcosortError, SchemaVersion};
use ecosort_gameplay::{InputError, InputEvent, KeyCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Script loading and validation errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Script file could not be read
    #[error("failed to read script {}: {source}", path.display())]
    Io {
        /// Script path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Script is not valid RON
    #[error("failed to parse script: {0}")]
    Parse(String),

    /// An entry names a key the game does not know
    #[error("input #{index}: {source}")]
    UnknownKey {
        /// Entry index
        index: usize,
        /// Parse failure
        #[source]
        source: InputError,
    },

    /// An entry fires before the one preceding it
    #[error("input #{index} at frame {frame} comes after frame {previous}")]
    OutOfOrder {
        /// Entry index
        index: usize,
        /// Its frame
        frame: u64,
        /// Frame of the previous entry
        previous: u64,
    },

    /// Unreadable schema version
    #[error(transparent)]
    Core(#[from] EcosortError),
}

/// Event of one scripted entry, with keys by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptEvent {
    /// Press a key
    KeyDown(String),
    /// Release a key
    KeyUp(String),
    /// Start over with a fresh session
    Restart,
}

/// One scripted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Frame the event fires on, before that frame's tick
    pub frame: u64,
    /// What happens
    pub event: ScriptEvent,
}

/// A complete input script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputScript {
    /// Script schema version
    #[serde(default)]
    pub version: SchemaVersion,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Entries in firing order
    #[serde(default)]
    pub inputs: Vec<ScriptedInput>,
}

impl InputScript {
    /// Reads a script from a RON file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let script = Self::from_ron(&contents)?;
        info!(
            "Loaded input script '{}' from {} ({} inputs)",
            script.name,
            path.display(),
            script.inputs.len()
        );
        Ok(script)
    }

    /// Parses a script from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ScriptError> {
        let script: Self = ron::from_str(text).map_err(|e| ScriptError::Parse(e.to_string()))?;
        SchemaVersion::INPUT_SCRIPT.require_readable(&script.version)?;
        Ok(script)
    }

    /// Frame of the last entry.
    #[must_use]
    pub fn last_frame(&self) -> Option<u64> {
        self.inputs.last().map(|input| input.frame)
    }
}

/// What the application should do for a scripted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayAction {
    /// Feed a key edge to the session
    Input(InputEvent),
    /// Rebuild the session
    Restart,
}

/// Plays a validated script back frame by frame.
#[derive(Debug, Clone)]
pub struct ScriptPlayer {
    /// Resolved entries in firing order
    actions: Vec<(u64, ReplayAction)>,
    /// Next entry to fire
    index: usize,
}

impl ScriptPlayer {
    /// Validates the script and resolves key names.
    ///
    /// Frames must be non-decreasing and every key name must parse.
    pub fn new(script: &InputScript) -> Result<Self, ScriptError> {
        let mut actions = Vec::with_capacity(script.inputs.len());
        let mut previous = 0;

        for (index, input) in script.inputs.iter().enumerate() {
            if input.frame < previous {
                return Err(ScriptError::OutOfOrder {
                    index,
                    frame: input.frame,
                    previous,
                });
            }
            previous = input.frame;

            let key = |name: &str| name.parse::<KeyCode>().map_err(|source| ScriptError::UnknownKey { index, source });
            let action = match &input.event {
                ScriptEvent::KeyDown(name) => ReplayAction::Input(InputEvent::KeyDown(key(name)?)),
                ScriptEvent::KeyUp(name) => ReplayAction::Input(InputEvent::KeyUp(key(name)?)),
                ScriptEvent::Restart => ReplayAction::Restart,
            };
            actions.push((input.frame, action));
        }

        Ok(Self { actions, index: 0 })
    }

    /// A player with nothing to replay.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            index: 0,
        }
    }

    /// Takes every action due at or before `frame`.
    pub fn due(&mut self, frame: u64) -> Vec<ReplayAction> {
        let start = self.index;
        while self.index < self.actions.len() && self.actions[self.index].0 <= frame {
            self.index += 1;
        }
        self.actions[start..self.index].iter().map(|(_, action)| *action).collect()
    }

    /// Whether every action has fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.index >= self.actions.len()
    }

    /// Actions not yet fired.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.actions.len() - self.index
    }
}
