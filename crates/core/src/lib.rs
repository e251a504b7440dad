#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Flag Master quiz.
//!
//! This crate hosts the flag catalog, the per-session state machine
//! with its scoring rules, the persisted leaderboard, and configuration
//! used by the terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod leaderboard;
pub mod session;

pub use catalog::{pick_random_round, CatalogError, FlagRecord, RoundCatalog};
pub use config::AppConfig;
pub use leaderboard::{placement, record_entry, LeaderboardEntry, LeaderboardStore, Standing};
pub use session::{GameSession, Notification, Phase, SessionEvent, SessionState, SessionSummary};
