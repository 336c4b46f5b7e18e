//! Step completion ledger over a [`SessionStore`].
//!
//! The ledger guarantees monotonicity and idempotence only. It does not know
//! which step may follow which; pages call `mark_step_done` after a puzzle is
//! actually solved.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::progress::Progress;
use crate::core::types::StepId;
use crate::io::store::SessionStore;

/// Value stored under `step<n>` once the step is complete.
pub const STEP_DONE: &str = "1";

pub struct StepLedger<'s, S: SessionStore + ?Sized> {
    store: &'s S,
    max_steps: u8,
}

impl<'s, S: SessionStore + ?Sized> StepLedger<'s, S> {
    pub fn new(store: &'s S, max_steps: u8) -> Self {
        Self { store, max_steps }
    }

    pub fn step(&self, n: u8) -> Result<StepId> {
        StepId::new(n, self.max_steps)
    }

    /// True iff the step flag is present and marked complete.
    pub fn is_step_done(&self, step: StepId) -> Result<bool> {
        let value = self.store.get(&step.store_key())?;
        Ok(value.as_deref() == Some(STEP_DONE))
    }

    /// Record `step` as complete. No write when it already is.
    pub fn mark_step_done(&self, step: StepId) -> Result<()> {
        if self.is_step_done(step)? {
            debug!(step = step.get(), "step already complete");
            return Ok(());
        }
        self.store.set(&step.store_key(), STEP_DONE)?;
        info!(step = step.get(), "step complete");
        Ok(())
    }

    /// Clear flags `1..=max_steps`. Only session start calls this.
    pub fn reset_all(&self, max_steps: u8) -> Result<()> {
        for n in 1..=max_steps {
            self.store.remove(&format!("step{n}"))?;
        }
        debug!(max_steps, "step flags cleared");
        Ok(())
    }

    /// Snapshot of every step's completion flag.
    pub fn progress(&self) -> Result<Progress> {
        let mut completed = BTreeSet::new();
        for n in 1..=self.max_steps {
            if self.is_step_done(StepId::new(n, self.max_steps)?)? {
                completed.insert(n);
            }
        }
        Ok(Progress::from_completed(self.max_steps, &completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;

    #[test]
    fn mark_step_done_is_idempotent() {
        let store = MemoryStore::new();
        let ledger = StepLedger::new(&store, 5);
        let step = ledger.step(2).expect("step");

        ledger.mark_step_done(step).expect("mark");
        let once = store.entries();
        ledger.mark_step_done(step).expect("mark again");
        assert_eq!(store.entries(), once);
        assert!(ledger.is_step_done(step).expect("done"));
    }

    #[test]
    fn only_the_done_marker_counts_as_complete() {
        let store = MemoryStore::new();
        store.set("step1", "true").expect("set");
        let ledger = StepLedger::new(&store, 5);
        assert!(!ledger.is_step_done(ledger.step(1).expect("step")).expect("done"));
    }

    #[test]
    fn reset_all_clears_only_step_flags() {
        let store = MemoryStore::new();
        store.set("sessionExpiry", "42").expect("set");
        let ledger = StepLedger::new(&store, 5);
        for n in 1..=5 {
            ledger.mark_step_done(ledger.step(n).expect("step")).expect("mark");
        }

        ledger.reset_all(5).expect("reset");
        assert!(ledger.progress().expect("progress").completed().is_empty());
        assert_eq!(store.get("sessionExpiry").expect("get"), Some("42".to_string()));
    }

    #[test]
    fn progress_reports_each_step() {
        let store = MemoryStore::new();
        let ledger = StepLedger::new(&store, 5);
        ledger.mark_step_done(ledger.step(3).expect("step")).expect("mark");

        let progress = ledger.progress().expect("progress");
        assert_eq!(progress.completed(), BTreeSet::from([3]));
        assert_eq!(progress.steps.len(), 5);
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let store = MemoryStore::new();
        let ledger = StepLedger::new(&store, 5);
        assert!(ledger.step(6).is_err());
        assert!(ledger.step(0).is_err());
    }
}
