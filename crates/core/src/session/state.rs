#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Lives granted at the start of every session.
pub const STARTING_LIVES: u32 = 3;
/// Points for a correct answer with no running streak.
pub const BASE_POINTS: u32 = 10;

/// Points awarded for a correct answer given the streak held before it.
///
/// A fresh streak scores 10, then 20, 30, ...
pub fn points_for_streak(streak_before: u32) -> u32 {
    BASE_POINTS.saturating_mul(streak_before.saturating_add(1))
}

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for `start`.
    NotStarted,
    /// A flag is shown and an answer is expected.
    Playing,
    /// The answer has been revealed; waiting for `advance`.
    Revealed,
    /// Out of lives; only `reset` does anything.
    GameOver,
}

/// Mutable state of one play-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub started: bool,
    pub game_over: bool,
    pub current_round_index: usize,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub lives: u32,
    pub flags_answered: u32,
    pub selected_option: Option<String>,
    pub revealed: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            started: false,
            game_over: false,
            current_round_index: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            lives: STARTING_LIVES,
            flags_answered: 0,
            selected_option: None,
            revealed: false,
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if !self.started {
            Phase::NotStarted
        } else if self.game_over {
            Phase::GameOver
        } else if self.revealed {
            Phase::Revealed
        } else {
            Phase::Playing
        }
    }

    /// Whether a new answer would be accepted.
    pub fn accepts_answer(&self) -> bool {
        self.phase() == Phase::Playing
    }

    /// Whether `advance` would move to a new round.
    pub fn can_advance(&self) -> bool {
        self.phase() == Phase::Revealed
    }

    /// Points the next correct answer would earn.
    pub fn next_award(&self) -> u32 {
        points_for_streak(self.streak)
    }

    pub(crate) fn record_correct(&mut self) -> u32 {
        let points = points_for_streak(self.streak);
        self.score = self.score.saturating_add(points);
        self.streak = self.streak.saturating_add(1);
        self.best_streak = self.best_streak.max(self.streak);
        self.flags_answered = self.flags_answered.saturating_add(1);
        points
    }

    pub(crate) fn record_wrong(&mut self) {
        self.streak = 0;
        self.lives = self.lives.saturating_sub(1);
        self.flags_answered = self.flags_answered.saturating_add(1);
        if self.lives == 0 {
            self.game_over = true;
        }
    }
}
