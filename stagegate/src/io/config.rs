//! Stage configuration stored under `.stagegate/state/config.toml`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::write_atomic;
use crate::core::types::PageId;

/// Upper bound for `max_steps`.
pub const MAX_STEPS_LIMIT: u8 = 32;

/// Challenge configuration (TOML).
///
/// Missing fields default to the standard five-step, 45 minute challenge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StageConfig {
    /// Length of a session, set once at start.
    pub session_duration_secs: u64,

    /// The timer is flagged as a warning at or below this many seconds.
    pub warning_threshold_secs: u64,

    /// Period of the countdown tick.
    pub tick_interval_ms: u64,

    /// Delay before the continuation of an accepted answer runs.
    pub answer_continuation_ms: u64,

    /// Steps are numbered `1..=max_steps`.
    pub max_steps: u8,

    pub pages: PageConfig,

    /// Page name -> steps that must all be complete before it renders.
    pub rules: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageConfig {
    /// Where a participant starts a session.
    pub entry: String,
    /// Default redirect target for unmet prerequisites.
    pub hub: String,
    /// Where an expired session lands.
    pub failure: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            entry: "index.html".to_string(),
            hub: "dashboard.html".to_string(),
            failure: "fail.html".to_string(),
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        let rules = BTreeMap::from([
            ("dashboard.html".to_string(), Vec::new()),
            ("clue1.html".to_string(), Vec::new()),
            ("morse.html".to_string(), vec![1, 2, 3]),
            ("breach.html".to_string(), vec![1, 2, 3, 4]),
        ]);
        Self {
            session_duration_secs: 45 * 60,
            warning_threshold_secs: 5 * 60,
            tick_interval_ms: 1000,
            answer_continuation_ms: 600,
            max_steps: 5,
            pages: PageConfig::default(),
            rules,
        }
    }
}

impl StageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.session_duration_secs == 0 {
            return Err(anyhow!("session_duration_secs must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(anyhow!("tick_interval_ms must be > 0"));
        }
        if self.max_steps == 0 || self.max_steps > MAX_STEPS_LIMIT {
            return Err(anyhow!("max_steps must be in 1..={MAX_STEPS_LIMIT}"));
        }

        let pages = [
            ("pages.entry", &self.pages.entry),
            ("pages.hub", &self.pages.hub),
            ("pages.failure", &self.pages.failure),
        ];
        for (field, name) in pages {
            if name.trim().is_empty() {
                return Err(anyhow!("{field} must be non-empty"));
            }
            if name.contains('/') {
                return Err(anyhow!("{field} must be a page name, not a path"));
            }
        }
        let distinct: BTreeSet<&String> = pages.iter().map(|(_, name)| *name).collect();
        if distinct.len() != pages.len() {
            return Err(anyhow!("pages.entry, pages.hub and pages.failure must differ"));
        }

        for (page, steps) in &self.rules {
            if let Some(step) = steps.iter().find(|s| **s == 0 || **s > self.max_steps) {
                return Err(anyhow!(
                    "rules.\"{page}\": step {step} out of range 1..={}",
                    self.max_steps
                ));
            }
        }
        if self.rules.get(&self.pages.hub).is_some_and(|s| !s.is_empty()) {
            return Err(anyhow!(
                "rules.\"{}\": the hub page must not require steps",
                self.pages.hub
            ));
        }
        Ok(())
    }

    pub fn entry_page(&self) -> PageId {
        PageId::new(self.pages.entry.clone())
    }

    pub fn hub_page(&self) -> PageId {
        PageId::new(self.pages.hub.clone())
    }

    pub fn failure_page(&self) -> PageId {
        PageId::new(self.pages.failure.clone())
    }

    /// Pages that are never guarded and never run the countdown.
    pub fn is_excluded(&self, page: &PageId) -> bool {
        page.as_str() == self.pages.entry || page.as_str() == self.pages.failure
    }

    /// Required steps for `page`. Pages without a rule require nothing.
    pub fn required_steps(&self, page: &PageId) -> &[u8] {
        self.rules
            .get(page.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn answer_continuation(&self) -> Duration {
        Duration::from_millis(self.answer_continuation_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `StageConfig::default()`.
pub fn load_config(path: &Path) -> Result<StageConfig> {
    if !path.exists() {
        let cfg = StageConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StageConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &StageConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf, "toml.tmp")
}
