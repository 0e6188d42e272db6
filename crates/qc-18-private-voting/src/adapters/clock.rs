//! Manual Clock Adapter
//!
//! Implements `LogicalClock` with a host-driven counter.

use crate::domain::Timestamp;
use crate::ports::outbound::LogicalClock;
use parking_lot::RwLock;

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Set current time.
    pub fn set_time(&self, time: Timestamp) {
        *self.now.write() = time;
    }

    /// Advance time.
    pub fn advance(&self, delta: Timestamp) {
        let mut now = self.now.write();
        *now = now.saturating_add(delta);
    }
}

impl LogicalClock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}
