use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Normal
    }
}

impl Difficulty {
    pub fn all() -> Vec<Difficulty> {
        vec![Difficulty::Easy, Difficulty::Normal, Difficulty::Hard]
    }

    pub fn index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Selector index to difficulty; anything out of range falls back to Normal.
    pub fn from_index(index: usize) -> Difficulty {
        match index {
            0 => Difficulty::Easy,
            1 => Difficulty::Normal,
            2 => Difficulty::Hard,
            _ => Difficulty::Normal,
        }
    }

    pub fn dice_count(&self) -> usize {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 10,
            Difficulty::Hard => 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(input: &str) -> Option<Difficulty> {
        match input.trim().to_lowercase().as_str() {
            "easy" | "5" => Some(Difficulty::Easy),
            "normal" | "10" => Some(Difficulty::Normal),
            "hard" | "15" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl TryFrom<usize> for Difficulty {
    type Error = GameError;

    fn try_from(dice_count: usize) -> Result<Self, Self::Error> {
        Difficulty::all()
            .into_iter()
            .find(|d| d.dice_count() == dice_count)
            .ok_or(GameError::InvalidDifficulty(dice_count))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} dice)", self.label(), self.dice_count())
    }
}
