use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::TimestampSeconds;
use std::time::SystemTime;

use crate::model::Difficulty;

pub const LEADERBOARD_SIZE: usize = 5;

/// One finished round. Serialized with the short `name`/`time` keys so older
/// saves that only carry those two fields still load.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct LeaderboardEntry {
    #[serde(rename = "name")]
    pub player_name: String,
    #[serde(rename = "time")]
    pub time_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolls: Option<u32>,
    #[serde_as(as = "Option<TimestampSeconds>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SystemTime>,
}

impl LeaderboardEntry {
    pub fn new(player_name: impl Into<String>, time_seconds: u32) -> Self {
        Self {
            player_name: player_name.into(),
            time_seconds,
            difficulty: None,
            rolls: None,
            timestamp: None,
        }
    }

    pub fn with_round(mut self, difficulty: Difficulty, rolls: u32, now: SystemTime) -> Self {
        self.difficulty = Some(difficulty);
        self.rolls = Some(rolls);
        self.timestamp = Some(now);
        self
    }

    /// "Ava - 42s", plus difficulty and local date when known.
    pub fn describe(&self) -> String {
        let mut line = format!("{} - {}s", self.player_name, self.time_seconds);
        if let Some(difficulty) = self.difficulty {
            line.push_str(&format!(" ({})", difficulty.label()));
        }
        if let Some(timestamp) = self.timestamp {
            let date: DateTime<Local> = timestamp.into();
            line.push_str(&format!(" on {}", date.format("%Y-%m-%d %H:%M")));
        }
        line
    }
}

/// Fastest rounds first, never more than [`LEADERBOARD_SIZE`] of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a leaderboard from arbitrary entries, restoring order and size.
    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        let mut leaderboard = Self { entries };
        leaderboard.normalize();
        leaderboard
    }

    pub fn record(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
        self.normalize();
    }

    fn normalize(&mut self) {
        // stable sort: equal times keep arrival order
        self.entries.sort_by_key(|e| e.time_seconds);
        self.entries.truncate(LEADERBOARD_SIZE);
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }
}
