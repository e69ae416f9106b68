use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{Die, DieId, Difficulty, RoundClock};
use crate::game::DiceSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Running,
    Won,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub dice: Vec<Die>,
    pub difficulty: Difficulty,
    pub clock: RoundClock,
    pub won: bool,
    pub rolls: u32,
}

impl GameState {
    pub fn new(difficulty: Difficulty, source: &mut dyn DiceSource) -> Self {
        let dice = (0..difficulty.dice_count())
            .map(|_| Die::new(source.next_face()))
            .collect();
        Self {
            dice,
            difficulty,
            clock: RoundClock::default(),
            won: false,
            rolls: 0,
        }
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.clock.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn phase(&self) -> RoundPhase {
        if self.won {
            RoundPhase::Won
        } else if self.clock.is_running() {
            RoundPhase::Running
        } else {
            RoundPhase::Idle
        }
    }

    pub fn die(&self, id: DieId) -> Option<&Die> {
        self.dice.iter().find(|d| d.id == id)
    }

    pub(crate) fn die_mut(&mut self, id: DieId) -> Option<&mut Die> {
        self.dice.iter_mut().find(|d| d.id == id)
    }

    /// Re-rolls every unheld die. Held dice keep their value.
    pub(crate) fn roll_unheld(&mut self, source: &mut dyn DiceSource) {
        for die in self.dice.iter_mut().filter(|d| !d.held) {
            die.value = source.next_face();
        }
        self.rolls += 1;
    }

    /// All dice held and showing the same face.
    pub fn is_tenzie(&self) -> bool {
        is_tenzie(&self.dice)
    }

    pub fn held_value(&self) -> Option<u8> {
        self.dice.iter().find(|d| d.held).map(|d| d.value)
    }

    /// An unheld die whose face differs from the value already being held.
    pub fn is_mismatch(&self, die: &Die) -> bool {
        match self.held_value() {
            Some(value) => !die.held && die.value != value,
            None => false,
        }
    }

    pub fn held_count(&self) -> usize {
        self.dice.iter().filter(|d| d.held).count()
    }
}

pub fn is_tenzie(dice: &[Die]) -> bool {
    !dice.is_empty() && dice.iter().all(|d| d.held) && dice.iter().map(|d| d.value).all_equal()
}
