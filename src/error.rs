//! Error taxonomy for the watcher operation.
//! Adapters report plain `anyhow` errors with context; the watcher
//! classifies them at the seam so callers can tell the phases apart.

use crate::domain::Revision;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// The working copy is not in a readable version-controlled state.
    /// Never reported as "no change".
    #[error("failed to read working copy revision")]
    RevisionRead(#[source] anyhow::Error),

    /// Synchronization with the remote failed; the restart action was
    /// not invoked.
    #[error("synchronization with remote failed")]
    Sync(#[source] anyhow::Error),

    /// The restart action failed after the working copy was already
    /// updated to `after`. Re-running the restart alone is safe; the
    /// sync is not rolled back.
    #[error("restart failed after update to {}", after.short())]
    Restart {
        after: Revision,
        #[source]
        source: anyhow::Error,
    },
}
