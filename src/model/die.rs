use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type DieId = Uuid;

pub const MIN_FACE: u8 = 1;
pub const MAX_FACE: u8 = 6;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    pub id: DieId,
    pub value: u8,
    pub held: bool,
}

impl Die {
    pub fn new(value: u8) -> Self {
        debug_assert!((MIN_FACE..=MAX_FACE).contains(&value));
        Self {
            id: Uuid::new_v4(),
            value,
            held: false,
        }
    }

    pub fn toggle_held(&mut self) {
        self.held = !self.held;
    }
}

impl fmt::Debug for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.held {
            write!(f, "[{}]", self.value)
        } else {
            write!(f, " {} ", self.value)
        }
    }
}
