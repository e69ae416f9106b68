use super::{Die, DieId, Difficulty, GameState, Leaderboard, LeaderboardEntry};
use crate::error::GameError;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoundStarted {
        difficulty: Difficulty,
        dice: Vec<Die>,
    },
    /// First roll or hold of a round; the clock is now running
    RoundRunning,
    DiceRolled {
        dice: Vec<Die>,
        rolls: u32,
    },
    DieHeld {
        id: DieId,
        held: bool,
    },
    TimerTicked(u32),
    Won(LeaderboardEntry),
    Celebrate,
    ResetRequested,
    Reset {
        full: bool,
    },
    LeaderboardChanged(Leaderboard),
    PlayerNameChanged(String),
    CommandRejected(GameError),
    /// Full picture for a collaborator that attaches mid-round
    Snapshot {
        state: GameState,
        leaderboard: Leaderboard,
        player_name: Option<String>,
    },
}
