use serde::{Deserialize, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Paired monotonic and wall-clock readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub timestamp_us: u64,
    pub unix_us: u64,
}

/// Clock anchored at simulator start.
#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    start: Instant,
}

impl TimeBase {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Monotonic microseconds since start.
    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Wall-clock microseconds since the Unix epoch; zero if the clock is
    /// set before 1970.
    pub fn unix_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            timestamp_us: self.now_us(),
            unix_us: self.unix_us(),
        }
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_stamps_never_go_back() {
        let tb = TimeBase::new();
        let first = tb.stamp();
        let second = tb.stamp();
        assert!(second.timestamp_us >= first.timestamp_us);
        assert!(first.unix_us > 0);
    }
}
