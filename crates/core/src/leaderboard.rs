//! Persisted top-10 leaderboard.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::{self, LEADERBOARD_FILE},
    session::SessionSummary,
};

/// Maximum number of entries kept.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// A finished session as shown on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Final score.
    pub score: u32,
    /// Local date the session ended, e.g. `10/19/2026`.
    pub date: String,
    /// Best streak reached during the session.
    pub streak: u32,
    /// Number of flags answered.
    pub flags_answered: u32,
}

impl LeaderboardEntry {
    /// Build an entry for `summary`, stamped with today's date.
    pub fn new(summary: SessionSummary) -> Self {
        Self {
            score: summary.score,
            date: Local::now().format("%-m/%-d/%Y").to_string(),
            streak: summary.best_streak,
            flags_answered: summary.flags_answered,
        }
    }
}

/// Insert `entry`, keeping the list sorted by descending score and capped.
///
/// Equal scores keep their insertion order.
pub fn record_entry(
    mut entries: Vec<LeaderboardEntry>,
    entry: LeaderboardEntry,
) -> Vec<LeaderboardEntry> {
    entries.push(entry);
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(LEADERBOARD_CAPACITY);
    entries
}

/// Zero-based position a new `score` would take in `entries`, or `None` when
/// it falls off the end of a full board.
///
/// Equal scores already on the board stay ahead of the newcomer.
pub fn placement(entries: &[LeaderboardEntry], score: u32) -> Option<usize> {
    let index = entries.iter().filter(|entry| entry.score >= score).count();
    (index < LEADERBOARD_CAPACITY).then_some(index)
}

/// Leaderboard after recording a session, plus where that session landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Stored entries, best first.
    pub entries: Vec<LeaderboardEntry>,
    /// Zero-based index of the new entry, `None` if it was not kept.
    pub rank: Option<usize>,
}

/// Reads and writes the leaderboard file.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    path: PathBuf,
}

impl LeaderboardStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_path() -> PathBuf {
        config::default_data_root().join(LEADERBOARD_FILE)
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries. A missing or unreadable file counts as an empty leaderboard.
    pub fn load(&self) -> Vec<LeaderboardEntry> {
        if !self.path.exists() {
            return Vec::new();
        }
        match self.read_entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Ignoring leaderboard {}: {err:#}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Overwrite the stored entries.
    pub fn save(&self, entries: &[LeaderboardEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised =
            serde_json::to_vec_pretty(entries).context("failed to serialize leaderboard")?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Add `entry` to the stored leaderboard and persist the result.
    pub fn record(&self, entry: LeaderboardEntry) -> Result<Standing> {
        let score = entry.score;
        let current = self.load();
        let rank = placement(&current, score);
        let entries = record_entry(current, entry);
        self.save(&entries)?;
        info!(score, ?rank, total = entries.len(), "Leaderboard updated");
        Ok(Standing { entries, rank })
    }

    fn read_entries(&self) -> Result<Vec<LeaderboardEntry>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let entries = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(entries)
    }
}
