mod die;
mod difficulty;
mod game_command;
mod game_event;
mod game_state;
mod leaderboard;
mod player_profile;
mod round_clock;

pub use die::{Die, DieId, MAX_FACE, MIN_FACE};
pub use difficulty::Difficulty;
pub use game_command::GameCommand;
pub use game_event::GameEvent;
pub use game_state::{is_tenzie, GameState, RoundPhase};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LEADERBOARD_SIZE};
pub use player_profile::{PlayerProfile, ANONYMOUS_PLAYER};
pub use round_clock::RoundClock;
