//! Countdown state machine for one page load.
//!
//! The timer never keeps its own notion of elapsed time: every tick recomputes
//! the remaining seconds from the absolute expiry in the store. Expiry is a
//! one-way transition that clears the stored expiry exactly once.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::countdown::{format_clock, is_warning, remaining_secs};
use crate::core::types::PageId;
use crate::io::store::SessionStore;
use crate::session::clear_expiry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running { expiry_ms: i64 },
    Expired,
}

/// Display data for one countdown firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    pub remaining_secs: u64,
    /// `MM:SS`.
    pub display: String,
    pub warning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is stopped or already expired; nothing happened.
    Inert,
    /// Time remains.
    Running(Tick),
    /// This firing crossed zero. The stored expiry has been cleared.
    Expired { tick: Tick, redirect: PageId },
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    state: TimerState,
    warning_threshold_secs: u64,
    failure_page: PageId,
}

impl CountdownTimer {
    pub fn new(warning_threshold_secs: u64, failure_page: PageId) -> Self {
        Self {
            state: TimerState::Stopped,
            warning_threshold_secs,
            failure_page,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Begin counting down to `expiry_ms`. Only a stopped timer can start.
    pub fn start(&mut self, expiry_ms: i64) -> bool {
        if self.state != TimerState::Stopped {
            return false;
        }
        debug!(expiry_ms, "countdown started");
        self.state = TimerState::Running { expiry_ms };
        true
    }

    /// Stop without expiring (page teardown). An expired timer stays expired.
    pub fn stop(&mut self) {
        if let TimerState::Running { .. } = self.state {
            self.state = TimerState::Stopped;
        }
    }

    fn tick_for(&self, remaining_secs: u64) -> Tick {
        Tick {
            remaining_secs,
            display: format_clock(remaining_secs),
            warning: is_warning(remaining_secs, self.warning_threshold_secs),
        }
    }

    /// Handle one firing at `now_ms`.
    pub fn tick<S: SessionStore + ?Sized>(&mut self, store: &S, now_ms: i64) -> Result<TickOutcome> {
        let TimerState::Running { expiry_ms } = self.state else {
            return Ok(TickOutcome::Inert);
        };
        let remaining = remaining_secs(expiry_ms, now_ms);
        let tick = self.tick_for(remaining);
        if remaining > 0 {
            return Ok(TickOutcome::Running(tick));
        }

        self.state = TimerState::Expired;
        clear_expiry(store)?;
        info!(failure_page = %self.failure_page, "session expired");
        Ok(TickOutcome::Expired {
            tick,
            redirect: self.failure_page.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::session::{EXPIRY_KEY, read_expiry};

    fn timer() -> CountdownTimer {
        CountdownTimer::new(300, PageId::new("fail.html"))
    }

    #[test]
    fn stopped_timer_is_inert() {
        let store = MemoryStore::new();
        let mut timer = timer();
        assert_eq!(timer.tick(&store, 0).expect("tick"), TickOutcome::Inert);
    }

    #[test]
    fn running_tick_reports_clock_and_warning() {
        let store = MemoryStore::new();
        let mut timer = timer();
        timer.start(2_700_000);

        let TickOutcome::Running(tick) = timer.tick(&store, 0).expect("tick") else {
            panic!("expected running");
        };
        assert_eq!(tick.display, "45:00");
        assert!(!tick.warning);

        let TickOutcome::Running(tick) = timer.tick(&store, 2_400_000).expect("tick") else {
            panic!("expected running");
        };
        assert_eq!(tick.remaining_secs, 300);
        assert!(tick.warning);
    }

    #[test]
    fn expiry_clears_store_and_fires_once() {
        let store = MemoryStore::new();
        store.set(EXPIRY_KEY, "1000").expect("set");
        store.set("step1", "1").expect("set");
        let mut timer = timer();
        timer.start(1000);

        let outcome = timer.tick(&store, 1000).expect("tick");
        assert!(matches!(
            outcome,
            TickOutcome::Expired { ref redirect, .. } if redirect.as_str() == "fail.html"
        ));
        assert_eq!(read_expiry(&store).expect("read"), None);
        assert_eq!(store.get("step1").expect("get"), Some("1".to_string()));

        // A later start by another page must not be wiped by a stale firing.
        store.set(EXPIRY_KEY, "99999").expect("set");
        for now in [1000, 2000, 50_000] {
            assert_eq!(timer.tick(&store, now).expect("tick"), TickOutcome::Inert);
        }
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(read_expiry(&store).expect("read"), Some(99999));
    }

    #[test]
    fn expired_timer_cannot_restart() {
        let store = MemoryStore::new();
        let mut timer = timer();
        timer.start(0);
        timer.tick(&store, 10).expect("tick");
        assert!(!timer.start(10_000));
        timer.stop();
        assert_eq!(timer.state(), TimerState::Expired);
    }
}
