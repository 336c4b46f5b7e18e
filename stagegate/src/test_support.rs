//! Test-only helpers for building stores and on-disk stages.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::clock::Clock;
use crate::io::config::StageConfig;
use crate::io::init::{InitOptions, StagePaths, init_stage};
use crate::io::store::{FileStore, MemoryStore, SessionStore};
use crate::ledger::StepLedger;
use crate::session::{EXPIRY_KEY, start_session};

/// In-memory store with a session started at `now_ms` and `steps` complete.
pub fn started_store(config: &StageConfig, now_ms: i64, steps: &[u8]) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    start_session(&store, &Clock::fixed(now_ms), config)?;
    mark_steps(&store, config, steps)?;
    Ok(store)
}

pub fn mark_steps<S: SessionStore + ?Sized>(
    store: &S,
    config: &StageConfig,
    steps: &[u8],
) -> Result<()> {
    let ledger = StepLedger::new(store, config.max_steps);
    for n in steps {
        ledger.mark_step_done(ledger.step(*n)?)?;
    }
    Ok(())
}

/// Overwrite the stored expiry directly (e.g. to simulate an old session).
pub fn set_expiry<S: SessionStore + ?Sized>(store: &S, expiry_ms: i64) -> Result<()> {
    store.set(EXPIRY_KEY, &expiry_ms.to_string())
}

/// Temporary project root with `.stagegate/` initialized.
pub struct TestStage {
    dir: TempDir,
    paths: StagePaths,
}

impl TestStage {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        let paths = init_stage(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir, paths })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &StagePaths {
        &self.paths
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.paths.session_path)
    }
}
