//! Wall-clock abstraction so countdown and session start are testable.

use std::time::Duration;

use chrono::Utc;

/// Source of the current time in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(i64),
}

impl Clock {
    pub fn fixed(now_ms: i64) -> Self {
        Clock::Fixed(now_ms)
    }

    pub fn now_ms(&self) -> i64 {
        match self {
            Clock::System => Utc::now().timestamp_millis(),
            Clock::Fixed(ms) => *ms,
        }
    }

    /// Advance a fixed clock. No effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(ms) = self {
            *ms = ms.saturating_add(duration_ms(delta));
        }
    }
}

/// Duration in whole milliseconds, saturating at `i64::MAX`.
pub fn duration_ms(delta: Duration) -> i64 {
    i64::try_from(delta.as_millis()).unwrap_or(i64::MAX)
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_MS: i64 = 1_700_000_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = Clock::fixed(FIXED_TEST_MS);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now_ms(), FIXED_TEST_MS + 1500);
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::System;
        clock.advance(Duration::from_secs(3600));
        assert_eq!(clock, Clock::System);
        assert!(clock.now_ms() > FIXED_TEST_MS);
    }
}
