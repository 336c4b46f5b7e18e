//! Initialization helpers for `.stagegate/` scaffolding.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{StageConfig, write_config};
use super::store::write_entries;

/// All canonical paths within `.stagegate/` for a project root.
#[derive(Debug, Clone)]
pub struct StagePaths {
    pub root: PathBuf,
    pub stage_dir: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
}

impl StagePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let stage_dir = root.join(".stagegate");
        let state_dir = stage_dir.join("state");
        Self {
            root: root.clone(),
            stage_dir: stage_dir.clone(),
            state_dir: state_dir.clone(),
            config_path: state_dir.join("config.toml"),
            session_path: state_dir.join("session.json"),
        }
    }
}

/// Options for `init_stage`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite the existing config and wipe the session.
    pub force: bool,
}

/// Create `.stagegate/` scaffolding in `root`: default config and an empty
/// session store.
///
/// Fails if `.stagegate/` already exists unless `options.force` is set.
pub fn init_stage(root: &Path, options: &InitOptions) -> Result<StagePaths> {
    let paths = StagePaths::new(root);
    if paths.stage_dir.exists() && !options.force {
        return Err(anyhow!(
            "stagegate init: .stagegate already exists (use --force to overwrite)"
        ));
    }
    if paths.stage_dir.exists() && !paths.stage_dir.is_dir() {
        return Err(anyhow!(
            "stagegate init: .stagegate exists but is not a directory"
        ));
    }

    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create directory {}", paths.state_dir.display()))?;
    write_config(&paths.config_path, &StageConfig::default())?;
    write_entries(&paths.session_path, &BTreeMap::new())?;

    Ok(paths)
}
