//! Read-only HUD state.
//!
//! The UI collaborator renders a [`HudState`] snapshot and may answer with a
//! [`HudAction`]. Messages are derived from interaction outcomes here so the
//! state machine itself stays free of presentation text.

use ecosort_common::Category;
use serde::{Deserialize, Serialize};

use crate::interaction::InteractionOutcome;
use crate::progress::{GameProgress, GameState};

/// Message shown before the first interaction.
pub const WELCOME_MESSAGE: &str = "Pick up trash and sort it into the right bin";

/// Message shown when the game is won.
pub const WIN_MESSAGE: &str = "You win! Every piece of trash found its bin.";

/// Message shown when the game is lost.
pub const LOSE_MESSAGE: &str = "Game over! Too much trash went into the wrong bin.";

/// Snapshot of everything the HUD displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudState {
    /// Current score
    pub score: i32,
    /// Overall game state
    pub game_state: GameState,
    /// Status line
    pub message: String,
    /// Show the win banner
    pub show_win: bool,
    /// Show the lose banner
    pub show_lose: bool,
    /// Category of the held item, if any
    pub carrying: Option<Category>,
    /// Correct deposits per category
    pub deposited: Vec<(Category, u32)>,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            score: 0,
            game_state: GameState::Playing,
            message: WELCOME_MESSAGE.to_string(),
            show_win: false,
            show_lose: false,
            carrying: None,
            deposited: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }
}

impl HudState {
    /// Refreshes score, state, banners and tallies from progress.
    pub fn sync(&mut self, progress: &GameProgress, carrying: Option<Category>) {
        self.score = progress.score();
        self.game_state = progress.state();
        self.show_win = progress.state() == GameState::Won;
        self.show_lose = progress.state() == GameState::Lost;
        self.carrying = carrying;
        self.deposited = progress.deposited_counts();
    }

    /// Replaces the status line.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

/// Requests the UI may send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HudAction {
    /// Throw the session away and start over
    Restart,
}

/// Status line for an interaction outcome, if it warrants one.
#[must_use]
pub fn outcome_message(outcome: &InteractionOutcome) -> Option<String> {
    let message = match outcome {
        InteractionOutcome::Ignored => return None,
        InteractionOutcome::PickedUp { category, .. } => {
            format!("Picked up {category} trash. Find the {category} bin!")
        },
        InteractionOutcome::NothingInRange => "Nothing nearby to pick up".to_string(),
        InteractionOutcome::NoBinInRange { carrying } => {
            format!("No bin nearby. You are carrying {carrying} trash.")
        },
        InteractionOutcome::Deposited {
            item_category,
            bin_category,
            correct,
            transition,
            ..
        } => match transition.current {
            GameState::Won => WIN_MESSAGE.to_string(),
            GameState::Lost => LOSE_MESSAGE.to_string(),
            GameState::Playing if *correct => {
                format!("Correct! {item_category} trash belongs in the {bin_category} bin. +1")
            },
            GameState::Playing => {
                format!("Wrong bin! {item_category} trash does not go in the {bin_category} bin. -1")
            },
        },
    };
    Some(message)
}
