//! String-keyed persistence for the leaderboard and the player's name.
//!
//! The game must stay playable when storage misbehaves, so the typed wrappers
//! ([`Scoreboard`], [`ProfileStore`]) log failures and fall back to empty data
//! instead of returning errors to the controller.

mod file_store;
mod memory_store;
mod profile_store;
mod scoreboard;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use profile_store::ProfileStore;
pub use scoreboard::Scoreboard;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::StoreError;

pub const LEADERBOARD_KEY: &str = "leaderboard";
pub const PLAYER_NAME_KEY: &str = "playerName";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One store shared by the leaderboard and profile wrappers.
pub type SharedStore = Rc<RefCell<dyn KeyValueStore>>;

pub fn shared<S: KeyValueStore + 'static>(store: S) -> SharedStore {
    Rc::new(RefCell::new(store))
}
