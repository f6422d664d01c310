//! High score and best streak records
//!
//! Derived from session totals by the host, never by the session itself.
//! Persisted as JSON; keeps the top 10 finished sessions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::{Difficulty, SessionTotals};

/// Maximum number of leaderboard entries to keep
pub const MAX_ENTRIES: usize = 10;

/// A finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub score: u64,
    pub best_streak: u32,
    pub difficulty: Difficulty,
    /// Unix timestamp (ms) when the session ended
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Records {
    /// Highest session score ever seen
    pub high_score: u64,
    /// Longest streak ever seen
    pub best_streak: u32,
    /// Best sessions, sorted descending by score
    pub entries: Vec<RecordEntry>,
    /// Longest streak in the session being observed
    #[serde(skip)]
    session_streak: u32,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold live totals in. Returns true if a record was beaten.
    pub fn observe(&mut self, totals: &SessionTotals) -> bool {
        self.session_streak = self.session_streak.max(totals.streak);
        let mut improved = false;
        if totals.score > self.high_score {
            self.high_score = totals.score;
            improved = true;
        }
        if totals.streak > self.best_streak {
            self.best_streak = totals.streak;
            improved = true;
        }
        improved
    }

    /// Best streak reached in the session being observed
    pub fn session_streak(&self) -> u32 {
        self.session_streak
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Close out a session. Returns the leaderboard rank (1-indexed) if it
    /// qualified.
    pub fn finish_session(
        &mut self,
        totals: &SessionTotals,
        difficulty: Difficulty,
        timestamp: u64,
    ) -> Option<usize> {
        self.observe(totals);
        let best_streak = std::mem::take(&mut self.session_streak);
        let score = totals.score;
        if !self.qualifies(score) {
            return None;
        }

        let entry = RecordEntry {
            score,
            best_streak,
            difficulty,
            timestamp,
        };
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(pos + 1)
    }

    /// Load records, starting fresh on a missing or malformed file
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(json) = std::fs::read_to_string(path) {
            if let Ok(records) = serde_json::from_str::<Records>(&json) {
                log::info!("Loaded {} record entries", records.entries.len());
                return records;
            }
            log::warn!("Ignoring malformed records file {}", path.display());
        }
        log::info!("No records found, starting fresh");
        Self::new()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        log::info!("Records saved ({} entries)", self.entries.len());
        Ok(())
    }
}
