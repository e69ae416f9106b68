use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whole-second round clock. Advanced by ticks from the scheduler, never by
/// reading wall time, so a round can be replayed deterministically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClock {
    pub elapsed_seconds: u32,
    pub running: bool,
}

impl RoundClock {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.elapsed_seconds as u64)
    }

    pub fn started(&self) -> RoundClock {
        RoundClock {
            running: true,
            ..*self
        }
    }

    pub fn stopped(&self) -> RoundClock {
        RoundClock {
            running: false,
            ..*self
        }
    }

    /// Returns the advanced clock, or the same clock when stopped.
    pub fn ticked(&self) -> RoundClock {
        if self.running {
            RoundClock {
                elapsed_seconds: self.elapsed_seconds.saturating_add(1),
                ..*self
            }
        } else {
            *self
        }
    }
}
