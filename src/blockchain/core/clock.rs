use crate::transaction::Timestamp;

/// Wall clock that never runs backwards within one ledger.
///
/// Readings come from `chrono::Utc` in milliseconds; if the system clock
/// steps back, the previous reading is repeated instead.
#[derive(Debug, Clone, Default)]
pub struct LedgerClock {
    last: Timestamp,
}

impl LedgerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock no earlier than `floor`, used when restoring a chain.
    pub fn starting_at(floor: Timestamp) -> Self {
        Self { last: floor }
    }

    pub fn now(&mut self) -> Timestamp {
        let wall = chrono::Utc::now().timestamp_millis().max(0) as Timestamp;
        self.last = self.last.max(wall);
        self.last
    }

    pub fn last(&self) -> Timestamp {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_are_non_decreasing() {
        let mut clock = LedgerClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
        assert!(previous > 0);
    }

    #[test]
    fn test_floor_in_the_future_is_respected() {
        let far_future = chrono::Utc::now().timestamp_millis() as Timestamp + 3_600_000;
        let mut clock = LedgerClock::starting_at(far_future);
        assert_eq!(clock.now(), far_future);
        assert_eq!(clock.last(), far_future);
    }
}
