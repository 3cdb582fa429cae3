//! Managed process ports (traits).
//! The watcher never matches names against the global process table; it
//! only talks to an explicit registry of supervisory handles.

#![allow(dead_code)]

use anyhow::Result;

/// Supervisory handle for one managed process.
pub trait ProcessHandle {
    fn name(&self) -> &str;

    /// Whether the recorded instance is currently alive.
    fn is_running(&self) -> bool;

    /// Stop the running instance. Stopping a process that is not running
    /// is not an error.
    fn stop(&self) -> Result<()>;

    /// Start a fresh instance.
    fn start(&self) -> Result<()>;
}

/// Port for the restart step. The watcher only needs the action to be
/// callable and to report success or failure.
pub trait RestartAction {
    fn restart(&self) -> Result<()>;
}
