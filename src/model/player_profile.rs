use serde::{Deserialize, Serialize};

use crate::error::GameError;

pub const ANONYMOUS_PLAYER: &str = "Anonymous";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    name: Option<String>,
}

impl PlayerProfile {
    pub fn named(name: &str) -> Result<Self, GameError> {
        let mut profile = Self::default();
        profile.set_name(name)?;
        Ok(profile)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name to put on the leaderboard; never empty.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS_PLAYER)
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Stores the trimmed name. Blank input leaves the previous name in place.
    pub fn set_name(&mut self, name: &str) -> Result<&str, GameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(GameError::EmptyName);
        }
        Ok(self.name.insert(trimmed.to_string()).as_str())
    }
}
