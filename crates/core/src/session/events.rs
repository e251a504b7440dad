#![allow(missing_docs)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome emitted by a session transition for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started,
    Answered {
        correct: bool,
        /// Points awarded; zero for a wrong answer.
        points: u32,
        /// Streak after the answer.
        streak: u32,
        correct_answer: String,
    },
    GameOver {
        final_score: u32,
    },
    Reset,
}

/// Transient message handed to whatever displays notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    /// How long the message is meant to stay visible.
    pub duration: Duration,
}

impl SessionEvent {
    pub fn notification(&self) -> Notification {
        let (title, description, millis) = match self {
            SessionEvent::Started => (
                "🎯 Game Started!".to_string(),
                "Good luck learning the flags of the world!".to_string(),
                2_000,
            ),
            SessionEvent::Answered {
                correct: true,
                points,
                streak,
                ..
            } => (
                "✅ Correct!".to_string(),
                format!("+{points} points! Streak: {streak}"),
                2_000,
            ),
            SessionEvent::Answered {
                correct: false,
                correct_answer,
                ..
            } => (
                "❌ Wrong!".to_string(),
                format!("The correct answer was {correct_answer}"),
                3_000,
            ),
            SessionEvent::GameOver { final_score } => (
                "💔 Game Over!".to_string(),
                format!("Final score: {final_score}"),
                5_000,
            ),
            SessionEvent::Reset => (
                "🎮 Game Reset!".to_string(),
                "Ready to play again!".to_string(),
                2_000,
            ),
        };
        Notification {
            title,
            description,
            duration: Duration::from_millis(millis),
        }
    }
}
