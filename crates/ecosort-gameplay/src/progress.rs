//! Score keeping and win/lose evaluation.
//!
//! The controller is evaluated only when the score changes. Once the game has
//! ended it refuses further deposits, so the final score is frozen along with
//! the state.

use ecosort_common::Category;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Score at or above which the game is won.
pub const WIN_THRESHOLD: i32 = 5;

/// Score at or below which the game is lost.
pub const LOSE_THRESHOLD: i32 = -2;

/// Overall game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Input is live
    #[default]
    Playing,
    /// Score reached the win threshold
    Won,
    /// Score reached the lose threshold
    Lost,
}

impl GameState {
    /// Whether the game has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Result of recording one deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTransition {
    /// Score change applied (+1 or -1)
    pub delta: i32,
    /// Score after the change
    pub score: i32,
    /// State before the deposit
    pub previous: GameState,
    /// State after evaluation
    pub current: GameState,
}

impl ProgressTransition {
    /// True when this deposit ended the game.
    #[must_use]
    pub fn ended_game(&self) -> bool {
        !self.previous.is_terminal() && self.current.is_terminal()
    }
}

/// Score, per-category tallies and game state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameProgress {
    score: i32,
    deposited: [u32; 3],
    state: GameState,
}

impl GameProgress {
    /// Fresh progress: score 0, playing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Whether input should still be accepted.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self.state, GameState::Playing)
    }

    /// Correct deposits for one category.
    #[must_use]
    pub const fn deposited(&self, category: Category) -> u32 {
        self.deposited[category.index()]
    }

    /// Correct deposits for every category, in [`Category::ALL`] order.
    #[must_use]
    pub fn deposited_counts(&self) -> Vec<(Category, u32)> {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.deposited(category)))
            .collect()
    }

    /// Applies one deposit and re-evaluates the state.
    ///
    /// Returns `None` without touching anything if the game already ended.
    pub fn record_deposit(&mut self, category: Category, correct: bool) -> Option<ProgressTransition> {
        if !self.is_playing() {
            return None;
        }

        let previous = self.state;
        let delta = if correct {
            self.deposited[category.index()] += 1;
            1
        } else {
            -1
        };
        self.score += delta;
        self.state = Self::evaluate(self.score);

        if self.state.is_terminal() {
            info!(score = self.score, state = ?self.state, "Game over");
        }

        Some(ProgressTransition {
            delta,
            score: self.score,
            previous,
            current: self.state,
        })
    }

    /// State implied by a score.
    #[must_use]
    pub const fn evaluate(score: i32) -> GameState {
        if score >= WIN_THRESHOLD {
            GameState::Won
        } else if score <= LOSE_THRESHOLD {
            GameState::Lost
        } else {
            GameState::Playing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_correct_deposits_win() {
        let mut progress = GameProgress::new();
        for i in 1..=5 {
            let t = progress.record_deposit(Category::Organic, true).expect("playing");
            assert_eq!(t.score, i);
            assert_eq!(t.ended_game(), i == 5);
        }
        assert_eq!(progress.state(), GameState::Won);
        assert_eq!(progress.deposited(Category::Organic), 5);
    }

    #[test]
    fn test_two_incorrect_deposits_lose() {
        let mut progress = GameProgress::new();
        progress.record_deposit(Category::General, false);
        assert!(progress.is_playing());
        let t = progress.record_deposit(Category::General, false).expect("playing");
        assert!(t.ended_game());
        assert_eq!(progress.state(), GameState::Lost);
        assert_eq!(progress.score(), -2);
        assert_eq!(progress.deposited(Category::General), 0);
    }

    #[test]
    fn test_terminal_state_refuses_deposits() {
        let mut progress = GameProgress::new();
        progress.record_deposit(Category::Recyclable, false);
        progress.record_deposit(Category::Recyclable, false);

        assert!(progress.record_deposit(Category::Recyclable, true).is_none());
        assert_eq!(progress.score(), -2);
        assert_eq!(progress.state(), GameState::Lost);
    }

    #[test]
    fn test_evaluate_thresholds() {
        assert_eq!(GameProgress::evaluate(4), GameState::Playing);
        assert_eq!(GameProgress::evaluate(5), GameState::Won);
        assert_eq!(GameProgress::evaluate(-1), GameState::Playing);
        assert_eq!(GameProgress::evaluate(-2), GameState::Lost);
    }
}
