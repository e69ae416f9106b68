use std::fmt;

use crate::model::DieId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Dice count outside the supported difficulties
    InvalidDifficulty(usize),
    UnknownDieId(DieId),
    EmptyName,
    /// Roll or hold attempted after the round was won
    RoundOver,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidDifficulty(count) => {
                write!(f, "no difficulty plays with {} dice", count)
            }
            GameError::UnknownDieId(id) => write!(f, "no die with id {}", id),
            GameError::EmptyName => write!(f, "player name must not be empty"),
            GameError::RoundOver => write!(f, "the round is over; start a new game"),
        }
    }
}

impl std::error::Error for GameError {}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store i/o failed: {}", err),
            StoreError::Serialization(err) => write!(f, "store data unreadable: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}
