//! Per-page admission check.
//!
//! Runs once per page load, before the countdown starts. It only reads the
//! store: session existence first, then the page's prerequisites.

use anyhow::Result;
use tracing::debug;

use crate::core::admission::admit;
use crate::core::types::{Denial, PageId};
use crate::io::config::StageConfig;
use crate::io::store::SessionStore;
use crate::ledger::StepLedger;
use crate::session::read_expiry;

/// Result of guarding one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Entry or failure page: no check, no countdown.
    Ungated,
    /// The page may render; the countdown runs toward `expiry_ms`.
    Admitted { expiry_ms: i64 },
    /// The page may not render.
    Redirect { to: PageId, denial: Denial },
}

pub struct AccessGuard<'c> {
    config: &'c StageConfig,
}

impl<'c> AccessGuard<'c> {
    pub fn new(config: &'c StageConfig) -> Self {
        Self { config }
    }

    pub fn check<S: SessionStore + ?Sized>(&self, store: &S, page: &PageId) -> Result<Admission> {
        if self.config.is_excluded(page) {
            debug!(page = %page, "page is not gated");
            return Ok(Admission::Ungated);
        }

        let Some(expiry_ms) = read_expiry(store)? else {
            return Ok(self.deny(page, Denial::MissingSession));
        };

        let required = self.config.required_steps(page);
        let progress = StepLedger::new(store, self.config.max_steps).progress()?;
        if let Err(denial) = admit(&progress, required) {
            return Ok(self.deny(page, denial));
        }

        debug!(page = %page, expiry_ms, "page admitted");
        Ok(Admission::Admitted { expiry_ms })
    }

    fn deny(&self, page: &PageId, denial: Denial) -> Admission {
        let to = match denial {
            Denial::MissingSession => self.config.entry_page(),
            Denial::UnmetPrerequisite { .. } => self.config.hub_page(),
        };
        debug!(page = %page, %denial, to = %to, "page refused");
        Admission::Redirect { to, denial }
    }
}
