use log::{error, warn};

use super::{SharedStore, PLAYER_NAME_KEY};
use crate::model::PlayerProfile;

pub struct ProfileStore {
    store: SharedStore,
}

impl ProfileStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// A missing, blank or unreadable name yields an anonymous profile.
    pub fn load(&self) -> PlayerProfile {
        match self.store.borrow().get(PLAYER_NAME_KEY) {
            Ok(Some(name)) => PlayerProfile::named(&name).unwrap_or_default(),
            Ok(None) => PlayerProfile::default(),
            Err(err) => {
                warn!(target: "store", "Could not read player name: {}", err);
                PlayerProfile::default()
            }
        }
    }

    pub fn save(&self, profile: &PlayerProfile) {
        let result = match profile.name() {
            Some(name) => self.store.borrow_mut().set(PLAYER_NAME_KEY, name),
            None => self.store.borrow_mut().remove(PLAYER_NAME_KEY),
        };
        if let Err(err) = result {
            error!(target: "store", "Could not save player name: {}", err);
        }
    }
}
