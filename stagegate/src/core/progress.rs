//! In-memory snapshot of the step ledger.

use std::collections::BTreeSet;

use serde::Serialize;

/// Completion flag for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: u8,
    pub done: bool,
}

/// Completion state of steps `1..=max_steps`, in step order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub steps: Vec<StepStatus>,
}

impl Progress {
    /// Build a snapshot from the set of completed step ids.
    ///
    /// Ids outside `1..=max_steps` are ignored.
    pub fn from_completed(max_steps: u8, completed: &BTreeSet<u8>) -> Self {
        let steps = (1..=max_steps)
            .map(|step| StepStatus {
                step,
                done: completed.contains(&step),
            })
            .collect();
        Self { steps }
    }

    /// True iff `step` is tracked and complete. Unknown steps are not done.
    pub fn is_done(&self, step: u8) -> bool {
        self.steps.iter().any(|s| s.step == step && s.done)
    }

    pub fn completed(&self) -> BTreeSet<u8> {
        self.steps
            .iter()
            .filter(|s| s.done)
            .map(|s| s.step)
            .collect()
    }

    /// Checklist rows for display, e.g. `[x] step 1`.
    pub fn checklist(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| {
                let mark = if s.done { "[x]" } else { "[ ]" };
                format!("{mark} step {}", s.step)
            })
            .collect()
    }
}
