//! Manually driven clock.

use std::sync::Mutex;

use jiff::{SignedDuration, Timestamp};

use crate::clock::Clock;

/// Fixed starting instant; whole seconds so values survive the database round trip unchanged.
pub(crate) const TEST_EPOCH: &str = "2025-03-01T09:00:00Z";

#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self::starting_at(TEST_EPOCH.parse().expect("test epoch should parse"))
    }

    pub(crate) fn starting_at(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock().expect("clock lock poisoned");

        *now = now.checked_add(by).expect("clock advanced out of range");
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now_forward() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.advance(SignedDuration::from_mins(31));

        assert_eq!(clock.now().duration_since(start), SignedDuration::from_mins(31));
    }
}
