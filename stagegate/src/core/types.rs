//! Shared deterministic types for stagegate core logic.
//!
//! These types define stable contracts between the guard, the ledger, the
//! countdown and the page state machine. They do not touch storage or time.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Page identifier: the last `/`-separated segment of a page location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Resolve a page location (`/a/b/morse.html`, `morse.html`, `/`) to a page id.
    ///
    /// An empty last segment resolves to `entry`.
    pub fn from_location(location: &str, entry: &PageId) -> Self {
        let last = location.rsplit('/').next().unwrap_or_default();
        if last.is_empty() {
            return entry.clone();
        }
        Self(last.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Step identifier in `1..=max_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(u8);

impl StepId {
    pub fn new(n: u8, max_steps: u8) -> Result<Self> {
        if n == 0 || n > max_steps {
            bail!("step {n} out of range 1..={max_steps}");
        }
        Ok(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Persisted key for this step's completion flag.
    pub fn store_key(self) -> String {
        format!("step{}", self.0)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a state transition: stay on the current page or go elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect(PageId),
}

/// Why a gated page was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No (or an unparseable) session expiry is stored.
    MissingSession,
    /// A required step is not complete. Carries the first unmet step.
    UnmetPrerequisite { step: u8 },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::MissingSession => f.write_str("no active session"),
            Denial::UnmetPrerequisite { step } => write!(f, "step {step} not complete"),
        }
    }
}
