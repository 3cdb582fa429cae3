//! Watcher orchestration.
//! One linear pass over the ports: read revision, synchronize, read
//! revision again, restart if it moved.

use crate::domain::{SyncPolicy, SyncReport};
use crate::error::WatchError;
use crate::ports::{ProcessHandle, RestartAction, WorkingCopy};
use anyhow::Context;
use tracing::{debug, info};

/// Drives one sync-and-maybe-restart pass. All inputs are fixed at
/// construction; the caller owns scheduling and serialization of passes.
pub struct DeployWatcher<'a> {
    working_copy: &'a dyn WorkingCopy,
    restart: &'a dyn RestartAction,
    remote: String,
    branch: String,
    policy: SyncPolicy,
}

impl<'a> DeployWatcher<'a> {
    pub fn new(
        working_copy: &'a dyn WorkingCopy,
        restart: &'a dyn RestartAction,
        remote: &str,
        branch: &str,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            working_copy,
            restart,
            remote: remote.to_string(),
            branch: branch.to_string(),
            policy,
        }
    }

    /// Synchronize the working copy with the remote and restart the
    /// managed processes iff the checked-out revision changed.
    pub fn sync_and_maybe_restart(&self) -> Result<SyncReport, WatchError> {
        let before = self
            .working_copy
            .current_revision()
            .map_err(WatchError::RevisionRead)?;
        debug!(revision = before.short(), "working copy before sync");

        self.working_copy
            .sync(&self.remote, &self.branch, self.policy)
            .map_err(WatchError::Sync)?;

        let after = self
            .working_copy
            .current_revision()
            .map_err(WatchError::RevisionRead)?;

        if before == after {
            info!(revision = after.short(), "up to date, nothing to restart");
            return Ok(SyncReport {
                before,
                after,
                restarted: false,
            });
        }

        info!(
            before = before.short(),
            after = after.short(),
            "revision changed, restarting"
        );
        self.restart.restart().map_err(|source| WatchError::Restart {
            after: after.clone(),
            source,
        })?;

        Ok(SyncReport {
            before,
            after,
            restarted: true,
        })
    }
}

/// Restart action over an explicit registry of process handles:
/// stop every process, then start every process, in declaration order.
/// Re-running it without an intervening sync is safe.
pub struct Restarter {
    processes: Vec<Box<dyn ProcessHandle>>,
}

impl Restarter {
    pub fn new(processes: Vec<Box<dyn ProcessHandle>>) -> Self {
        Self { processes }
    }
}

impl RestartAction for Restarter {
    fn restart(&self) -> anyhow::Result<()> {
        for process in &self.processes {
            info!(process = process.name(), "stopping");
            process
                .stop()
                .with_context(|| format!("failed to stop '{}'", process.name()))?;
        }
        for process in &self.processes {
            info!(process = process.name(), "starting");
            process
                .start()
                .with_context(|| format!("failed to start '{}'", process.name()))?;
        }
        Ok(())
    }
}
