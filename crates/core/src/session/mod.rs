//! Game session state machine and its scoring rules.

mod events;
mod machine;
mod state;

pub use events::{Notification, SessionEvent};
pub use machine::{GameSession, SessionSummary};
pub use state::{points_for_streak, Phase, SessionState, BASE_POINTS, STARTING_LIVES};
