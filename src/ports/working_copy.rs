//! Working copy port (trait).
//! Defines the interface for revision reads and synchronization without
//! coupling to any version-control implementation.

#![allow(dead_code)]

use crate::domain::{Revision, SyncPolicy};
use anyhow::Result;
use std::path::PathBuf;

/// Port for the version-controlled working copy.
/// Implementations may use git2, shell commands, or test fakes.
pub trait WorkingCopy {
    /// Read the revision the working copy currently sits at.
    fn current_revision(&self) -> Result<Revision>;

    /// Bring the working copy up to date with `branch` on `remote`
    /// according to `policy`. On failure the working copy is left at its
    /// pre-sync revision wherever the implementation can guarantee it.
    fn sync(&self, remote: &str, branch: &str, policy: SyncPolicy) -> Result<()>;

    /// Root directory of the checkout.
    fn workdir(&self) -> Result<PathBuf>;
}
