//! Input mapping and motion intents.
//!
//! Key edges (down/up) are translated through rebindable [`KeyBindings`] into
//! either a change of the player's [`IntentState`] or an interact trigger.
//! Intents are plain data owned by the caller and handed to every tick.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur in the input system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Key name not recognized
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    /// Key already bound to another action
    #[error("key {key:?} already bound to action: {action:?}")]
    KeyAlreadyBound {
        /// The key that's already bound
        key: KeyCode,
        /// The action it's bound to
        action: InputAction,
    },
}

/// Key codes the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// E key
    E,
    /// R key
    R,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Space bar
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
}

impl KeyCode {
    const NAMES: [(Self, &'static str); 13] = [
        (Self::W, "w"),
        (Self::A, "a"),
        (Self::S, "s"),
        (Self::D, "d"),
        (Self::E, "e"),
        (Self::R, "r"),
        (Self::Up, "up"),
        (Self::Down, "down"),
        (Self::Left, "left"),
        (Self::Right, "right"),
        (Self::Space, "space"),
        (Self::Enter, "enter"),
        (Self::Escape, "escape"),
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(key, _)| *key == self)
            .map_or("?", |(_, name)| *name)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCode {
    type Err = InputError;

    /// Accepts plain names (`"w"`, `"space"`) as well as DOM-style codes
    /// (`"KeyW"`, `"ArrowUp"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let bare = lowered
            .strip_prefix("key")
            .filter(|rest| rest.len() == 1)
            .or_else(|| lowered.strip_prefix("arrow"))
            .unwrap_or(lowered.as_str());

        Self::NAMES
            .iter()
            .find(|(_, name)| *name == bare)
            .map(|(key, _)| *key)
            .ok_or_else(|| InputError::UnknownKey(s.to_string()))
    }
}

/// A discrete key edge delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// Key pressed
    KeyDown(KeyCode),
    /// Key released
    KeyUp(KeyCode),
}

/// Game actions keys can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// Walk forward
    MoveForward,
    /// Walk backward
    MoveBackward,
    /// Turn left
    TurnLeft,
    /// Turn right
    TurnRight,
    /// Pick up or deposit
    Interact,
}

/// Rebindable key to action mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, InputAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = [
            (KeyCode::W, InputAction::MoveForward),
            (KeyCode::Up, InputAction::MoveForward),
            (KeyCode::S, InputAction::MoveBackward),
            (KeyCode::Down, InputAction::MoveBackward),
            (KeyCode::A, InputAction::TurnLeft),
            (KeyCode::Left, InputAction::TurnLeft),
            (KeyCode::D, InputAction::TurnRight),
            (KeyCode::Right, InputAction::TurnRight),
            (KeyCode::E, InputAction::Interact),
            (KeyCode::Space, InputAction::Interact),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl KeyBindings {
    /// Bindings with no keys mapped.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Action bound to a key.
    #[must_use]
    pub fn action(&self, key: KeyCode) -> Option<InputAction> {
        self.bindings.get(&key).copied()
    }

    /// Binds a key, refusing to steal it from another action.
    pub fn bind(&mut self, key: KeyCode, action: InputAction) -> Result<(), InputError> {
        match self.bindings.get(&key) {
            Some(existing) if *existing != action => Err(InputError::KeyAlreadyBound {
                key,
                action: *existing,
            }),
            _ => {
                self.bindings.insert(key, action);
                Ok(())
            },
        }
    }

    /// Removes a key binding.
    pub fn unbind(&mut self, key: KeyCode) -> Option<InputAction> {
        self.bindings.remove(&key)
    }
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Key not bound, or the event was ignored
    Ignored,
    /// Forward or turn intent changed
    IntentChanged,
    /// Interact was pressed
    Interact,
}

/// Desired motion derived from held keys.
///
/// Both axes only ever hold -1, 0 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentState {
    /// +1 forward, -1 backward
    pub forward: f32,
    /// +1 right, -1 left
    pub turn: f32,
}

impl IntentState {
    /// Neutral intent.
    pub const IDLE: Self = Self {
        forward: 0.0,
        turn: 0.0,
    };

    /// Creates a neutral intent.
    #[must_use]
    pub fn new() -> Self {
        Self::IDLE
    }

    /// Applies one key edge.
    ///
    /// Releasing a movement key zeroes its whole axis. Interact fires on key
    /// down only.
    pub fn apply(&mut self, event: InputEvent, bindings: &KeyBindings) -> InputOutcome {
        let (key, pressed) = match event {
            InputEvent::KeyDown(key) => (key, true),
            InputEvent::KeyUp(key) => (key, false),
        };
        let Some(action) = bindings.action(key) else {
            return InputOutcome::Ignored;
        };

        match (action, pressed) {
            (InputAction::Interact, true) => return InputOutcome::Interact,
            (InputAction::Interact, false) => return InputOutcome::Ignored,
            (InputAction::MoveForward, true) => self.forward = 1.0,
            (InputAction::MoveBackward, true) => self.forward = -1.0,
            (InputAction::MoveForward | InputAction::MoveBackward, false) => self.forward = 0.0,
            (InputAction::TurnLeft, true) => self.turn = -1.0,
            (InputAction::TurnRight, true) => self.turn = 1.0,
            (InputAction::TurnLeft | InputAction::TurnRight, false) => self.turn = 0.0,
        }
        InputOutcome::IntentChanged
    }

    /// Zeroes both axes.
    pub fn freeze(&mut self) {
        *self = Self::IDLE;
    }

    /// Whether either axis exceeds `epsilon` in magnitude.
    #[must_use]
    pub fn is_active(&self, epsilon: f32) -> bool {
        self.forward.abs() > epsilon || self.turn.abs() > epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_parse() {
        assert_eq!("KeyW".parse::<KeyCode>(), Ok(KeyCode::W));
        assert_eq!("ArrowLeft".parse::<KeyCode>(), Ok(KeyCode::Left));
        assert_eq!("space".parse::<KeyCode>(), Ok(KeyCode::Space));
        assert_eq!("E".parse::<KeyCode>(), Ok(KeyCode::E));
        assert_eq!(
            "KeyQ".parse::<KeyCode>(),
            Err(InputError::UnknownKey("KeyQ".to_string()))
        );
    }

    #[test]
    fn test_movement_keys_set_and_clear_axes() {
        let bindings = KeyBindings::default();
        let mut intent = IntentState::new();

        assert_eq!(intent.apply(InputEvent::KeyDown(KeyCode::W), &bindings), InputOutcome::IntentChanged);
        intent.apply(InputEvent::KeyDown(KeyCode::Left), &bindings);
        assert_eq!(intent, IntentState { forward: 1.0, turn: -1.0 });

        intent.apply(InputEvent::KeyUp(KeyCode::W), &bindings);
        assert_eq!(intent.forward, 0.0);
        assert_eq!(intent.turn, -1.0);

        intent.apply(InputEvent::KeyUp(KeyCode::Left), &bindings);
        assert!(!intent.is_active(0.001));
    }

    #[test]
    fn test_interact_fires_on_key_down_only() {
        let bindings = KeyBindings::default();
        let mut intent = IntentState::new();

        assert_eq!(intent.apply(InputEvent::KeyDown(KeyCode::E), &bindings), InputOutcome::Interact);
        assert_eq!(intent.apply(InputEvent::KeyUp(KeyCode::E), &bindings), InputOutcome::Ignored);
        assert_eq!(intent, IntentState::IDLE);
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let bindings = KeyBindings::default();
        let mut intent = IntentState::new();
        assert_eq!(intent.apply(InputEvent::KeyDown(KeyCode::Escape), &bindings), InputOutcome::Ignored);
        assert_eq!(intent, IntentState::IDLE);
    }

    #[test]
    fn test_bind_refuses_conflicting_key() {
        let mut bindings = KeyBindings::default();
        assert_eq!(
            bindings.bind(KeyCode::W, InputAction::Interact),
            Err(InputError::KeyAlreadyBound {
                key: KeyCode::W,
                action: InputAction::MoveForward,
            })
        );

        bindings.unbind(KeyCode::W);
        assert!(bindings.bind(KeyCode::W, InputAction::Interact).is_ok());
        assert_eq!(bindings.action(KeyCode::W), Some(InputAction::Interact));
    }
}
