//! Cancellable task queue with explicit due times.
//!
//! Page contexts are single-threaded: nothing runs on its own. The owner asks
//! for due tasks with [`TaskQueue::pop_due`] and interprets the payloads.
//! Recurring entries are re-queued on their period grid, skipping any periods
//! that were missed while the owner was not draining.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::clock::duration_ms;

/// Handle returned by scheduling; used to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Scheduling capability handed to collaborators.
pub trait Scheduler<T> {
    /// Run `task` once, `delay` after `now_ms`.
    fn schedule(&mut self, now_ms: i64, delay: Duration, task: T) -> TaskHandle;

    /// Run `task` every `period`, first at `now_ms + period`.
    fn schedule_every(&mut self, now_ms: i64, period: Duration, task: T) -> TaskHandle;

    /// Cancel a task. Returns false if it was not pending (already ran, or
    /// already cancelled). Cancelling twice is harmless.
    fn cancel(&mut self, handle: TaskHandle) -> bool;
}

#[derive(Debug)]
struct Entry<T> {
    task: T,
    period_ms: Option<i64>,
}

/// Deterministic task queue ordered by (due time, scheduling order).
#[derive(Debug)]
pub struct TaskQueue<T> {
    next_id: u64,
    entries: BTreeMap<(i64, u64), Entry<T>>,
    due_by_id: HashMap<u64, i64>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T: Clone> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, due_ms: i64, task: T, period_ms: Option<i64>) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert((due_ms, id), Entry { task, period_ms });
        self.due_by_id.insert(id, due_ms);
        TaskHandle(id)
    }

    /// Earliest due time among pending tasks.
    pub fn next_due_ms(&self) -> Option<i64> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.due_by_id.contains_key(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    ///
    /// A recurring task stays pending under the same handle, next due at the
    /// first period boundary after `now_ms`. A stalled owner gets one firing,
    /// not one per missed period.
    pub fn pop_due(&mut self, now_ms: i64) -> Option<(TaskHandle, T)> {
        let (&(due_ms, id), _) = self.entries.first_key_value()?;
        if due_ms > now_ms {
            return None;
        }
        let entry = self.entries.remove(&(due_ms, id))?;
        match entry.period_ms {
            Some(period_ms) => {
                let next_due = next_period_after(due_ms, period_ms, now_ms);
                let task = entry.task.clone();
                self.entries.insert((next_due, id), entry);
                self.due_by_id.insert(id, next_due);
                Some((TaskHandle(id), task))
            }
            None => {
                self.due_by_id.remove(&id);
                Some((TaskHandle(id), entry.task))
            }
        }
    }

    /// Drop every pending task (page teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.due_by_id.clear();
    }
}

fn next_period_after(due_ms: i64, period_ms: i64, now_ms: i64) -> i64 {
    let next_due = due_ms.saturating_add(period_ms);
    if next_due > now_ms {
        return next_due;
    }
    let missed = (now_ms - next_due) / period_ms + 1;
    next_due.saturating_add(missed.saturating_mul(period_ms))
}

impl<T: Clone> Scheduler<T> for TaskQueue<T> {
    fn schedule(&mut self, now_ms: i64, delay: Duration, task: T) -> TaskHandle {
        self.insert(now_ms.saturating_add(duration_ms(delay)), task, None)
    }

    fn schedule_every(&mut self, now_ms: i64, period: Duration, task: T) -> TaskHandle {
        // A zero period would spin forever in one `pop_due` drain.
        let period_ms = duration_ms(period).max(1);
        self.insert(now_ms.saturating_add(period_ms), task, Some(period_ms))
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        let Some(due_ms) = self.due_by_id.remove(&handle.0) else {
            return false;
        };
        self.entries.remove(&(due_ms, handle.0));
        true
    }
}
