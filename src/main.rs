//! redeploy - pull-and-conditionally-restart deploy watcher
//!
//! Synchronizes a git working copy with its remote and restarts the
//! managed server processes exactly when the checked-out revision changed.

mod adapters;
mod config;
mod domain;
mod error;
mod ports;
mod watcher;

use adapters::{Git2WorkingCopy, ShellProcess};
use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use ports::ProcessHandle;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;
use watcher::{DeployWatcher, Restarter};

#[derive(Parser, Debug)]
#[command(name = "redeploy")]
#[command(about = "Sync a git checkout and restart its servers when it changes")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/redeploy/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the sync report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Keep running, syncing every N seconds, instead of a single pass
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --json.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("REDEPLOY_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    let working_copy = Git2WorkingCopy::open(&config.working_copy)
        .context("failed to open working copy. Is the configured path a git checkout?")?;

    let state_dir = config.resolve_state_dir()?;
    let handles: Vec<Box<dyn ProcessHandle>> = config
        .processes
        .iter()
        .cloned()
        .map(|spec| Box::new(ShellProcess::new(spec, &state_dir)) as Box<dyn ProcessHandle>)
        .collect();
    let restarter = Restarter::new(handles);

    let watcher = DeployWatcher::new(
        &working_copy,
        &restarter,
        &config.remote,
        &config.branch,
        config.policy,
    );

    match args.interval {
        None => run_once(&watcher, args.json),
        Some(secs) => {
            // In interval mode this process is the scheduler: a failed
            // pass is logged and retried on the next tick.
            loop {
                if let Err(e) = run_once(&watcher, args.json) {
                    error!("sync pass failed: {e:#}");
                }
                std::thread::sleep(Duration::from_secs(secs));
            }
        }
    }
}

fn run_once(watcher: &DeployWatcher<'_>, json: bool) -> Result<()> {
    let report = watcher.sync_and_maybe_restart()?;
    if json {
        let payload = serde_json::json!({
            "time": chrono::Utc::now().to_rfc3339(),
            "before": report.before,
            "after": report.after,
            "changed": report.changed(),
            "restarted": report.restarted,
        });
        println!("{payload}");
    }
    Ok(())
}
