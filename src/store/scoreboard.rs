use log::{error, info, warn};

use super::{SharedStore, LEADERBOARD_KEY};
use crate::error::StoreError;
use crate::model::{Leaderboard, LeaderboardEntry};

/// The persisted top-5 leaderboard.
pub struct Scoreboard {
    store: SharedStore,
    leaderboard: Leaderboard,
}

impl Scoreboard {
    pub fn load(store: SharedStore) -> Self {
        let leaderboard = Self::read_latest(&store).unwrap_or_else(|err| {
            warn!(target: "store", "Could not read leaderboard: {}", err);
            Leaderboard::new()
        });
        info!(target: "store", "Loaded leaderboard with {} entries", leaderboard.len());
        Self { store, leaderboard }
    }

    /// A missing key or corrupted data counts as an empty leaderboard; only a
    /// failing store is an error.
    fn read_latest(store: &SharedStore) -> Result<Leaderboard, StoreError> {
        let Some(contents) = store.borrow().get(LEADERBOARD_KEY)? else {
            return Ok(Leaderboard::new());
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&contents) {
            Ok(entries) => Ok(Leaderboard::from_entries(entries)),
            Err(err) => {
                warn!(target: "store", "Ignoring corrupted leaderboard: {}", err);
                Ok(Leaderboard::new())
            }
        }
    }

    fn write(&self) -> Result<(), StoreError> {
        let contents = serde_json::to_string(&self.leaderboard)?;
        self.store.borrow_mut().set(LEADERBOARD_KEY, &contents)
    }

    /// Read the stored board, insert, sort, truncate and write back in one step.
    pub fn record(&mut self, entry: LeaderboardEntry) -> &Leaderboard {
        let mut latest = match Self::read_latest(&self.store) {
            Ok(latest) => latest,
            Err(err) => {
                warn!(
                    target: "store",
                    "Could not read leaderboard, using this session's: {}",
                    err
                );
                self.leaderboard.clone()
            }
        };
        latest.record(entry);
        self.leaderboard = latest;

        if let Err(err) = self.write() {
            error!(target: "store", "Could not save leaderboard: {}", err);
        }
        &self.leaderboard
    }

    pub fn clear(&mut self) {
        self.leaderboard.clear();
        if let Err(err) = self.store.borrow_mut().remove(LEADERBOARD_KEY) {
            error!(target: "store", "Could not clear leaderboard: {}", err);
        }
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn high_scores(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard
            .entries()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }
}
