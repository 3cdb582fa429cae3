//! Watcher configuration.
//! Everything is fixed at deployment time in a TOML file; the CLI only
//! picks which file to read.

use crate::domain::SyncPolicy;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the git checkout to keep in sync.
    pub working_copy: PathBuf,

    /// Remote to fetch from.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch on the remote that is the source of truth.
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_policy")]
    pub policy: SyncPolicy,

    /// Directory for pidfiles and captured process output.
    /// Defaults to the platform state directory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Managed processes, restarted when the working copy changes.
    #[serde(rename = "process")]
    pub processes: Vec<ProcessSpec>,
}

/// Declarative description of one managed process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSpec {
    pub name: String,
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_policy() -> SyncPolicy {
    SyncPolicy::FastForward
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        if config.processes.is_empty() {
            return Err(anyhow!("config must declare at least one [[process]]"));
        }
        Ok(config)
    }

    /// Default location: `<config dir>/redeploy/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("config dir not found"))?;
        Ok(dir.join("redeploy").join("config.toml"))
    }

    /// Directory for pidfiles and per-process logs.
    pub fn resolve_state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let base = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow!("state dir not found"))?;
        Ok(base.join("redeploy"))
    }
}
