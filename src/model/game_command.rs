use super::{DieId, Difficulty};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    NewGame(Difficulty),
    Roll,
    Hold(DieId),
    /// Roll while playing; ask for a reset once the round is won
    PrimaryAction,
    Tick,
    Celebrate,
    RequestReset,
    ResetRound,
    ResetAll,
    SetPlayerName(String),
    InitDisplay,
}
