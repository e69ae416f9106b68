pub mod controller;
pub mod dice_source;
pub mod scheduler;

pub use controller::GameController;
pub use dice_source::{DiceSource, RandomDice, ScriptedDice};
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, TaskId, TaskKind, TaskTick, ThreadScheduler};
