use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::VecDeque;

use crate::model::{MAX_FACE, MIN_FACE};

/// Supplies die faces in `MIN_FACE..=MAX_FACE`.
pub trait DiceSource {
    fn next_face(&mut self) -> u8;
}

pub struct RandomDice<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDice<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded from `seed`, or from the thread rng when none is given.
    /// Returns the seed used so a round can be replayed.
    pub fn seeded(seed: Option<u64>) -> (Self, u64) {
        let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
        (Self::from_seed(seed), seed)
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn next_face(&mut self) -> u8 {
        self.rng.random_range(MIN_FACE..=MAX_FACE)
    }
}

/// Replays a fixed list of faces, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new(faces: Vec<u8>) -> Self {
        assert!(!faces.is_empty(), "ScriptedDice needs at least one face");
        assert!(
            faces.iter().all(|f| (MIN_FACE..=MAX_FACE).contains(f)),
            "faces must be in {}..={}",
            MIN_FACE,
            MAX_FACE
        );
        Self {
            faces: faces.into(),
        }
    }

    pub fn constant(face: u8) -> Self {
        Self::new(vec![face])
    }
}

impl DiceSource for ScriptedDice {
    fn next_face(&mut self) -> u8 {
        let face = self.faces.pop_front().unwrap_or(MIN_FACE);
        self.faces.push_back(face);
        face
    }
}
