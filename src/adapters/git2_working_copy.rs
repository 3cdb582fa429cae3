//! Git2 implementation of the WorkingCopy port.

use crate::domain::{Revision, SyncPolicy};
use crate::ports::WorkingCopy;
use anyhow::{anyhow, Context, Result};
use git2::{AnnotatedCommit, AutotagOption, FetchOptions, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Git2WorkingCopy {
    repo: Repository,
}

impl Git2WorkingCopy {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)
            .with_context(|| format!("failed to open git repository at {}", path.display()))?;
        Ok(Self { repo })
    }

    fn fetch_branch(&self, remote_name: &str, branch: &str) -> Result<AnnotatedCommit<'_>> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .with_context(|| format!("remote '{}' is not configured", remote_name))?;

        let mut opts = FetchOptions::new();
        opts.download_tags(AutotagOption::None);
        remote
            .fetch(&[branch], Some(&mut opts), None)
            .with_context(|| format!("failed to fetch '{}' from '{}'", branch, remote_name))?;

        let fetch_head = self
            .repo
            .find_reference("FETCH_HEAD")
            .context("FETCH_HEAD missing after fetch")?;
        self.repo
            .reference_to_annotated_commit(&fetch_head)
            .context("failed to resolve fetched commit")
    }

    /// Advance HEAD's branch to the fetched commit, but only if no
    /// divergent local history exists. On divergence nothing is moved,
    /// so the checkout stays at its last known-good revision.
    fn fast_forward(&self, fetched: &AnnotatedCommit<'_>) -> Result<()> {
        let (analysis, _) = self
            .repo
            .merge_analysis(&[fetched])
            .context("merge analysis failed")?;

        if analysis.is_up_to_date() {
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(anyhow!(
                "local history has diverged from the remote; fast-forward is not possible"
            ));
        }

        let mut head = self.repo.head().context("failed to read HEAD")?;
        let head_name = head
            .name()
            .map(String::from)
            .ok_or_else(|| anyhow!("HEAD reference name is not valid UTF-8"))?;

        let message = format!("fast-forward to {}", fetched.id());
        head.set_target(fetched.id(), &message)
            .context("failed to advance branch reference")?;
        self.repo.set_head(&head_name)?;
        self.repo
            .checkout_head(Some(git2::build::CheckoutBuilder::default().force()))
            .context("failed to check out fast-forwarded tree")?;
        Ok(())
    }

    /// Force the checkout to exactly match the fetched commit, discarding
    /// local commits and uncommitted modifications.
    fn hard_reset(&self, fetched: &AnnotatedCommit<'_>) -> Result<()> {
        let object = self
            .repo
            .find_object(fetched.id(), None)
            .context("fetched commit not found locally")?;
        self.repo
            .reset(&object, git2::ResetType::Hard, None)
            .with_context(|| format!("failed to hard-reset to {}", fetched.id()))?;
        Ok(())
    }
}

impl WorkingCopy for Git2WorkingCopy {
    fn current_revision(&self) -> Result<Revision> {
        let head = self.repo.head().context("failed to read HEAD")?;
        let commit = head
            .peel_to_commit()
            .context("HEAD does not point at a commit")?;
        Ok(Revision::new(commit.id().to_string()))
    }

    fn sync(&self, remote: &str, branch: &str, policy: SyncPolicy) -> Result<()> {
        let fetched = self.fetch_branch(remote, branch)?;
        debug!(fetched = %fetched.id(), "fetched remote tip");

        match policy {
            SyncPolicy::FastForward => self.fast_forward(&fetched),
            SyncPolicy::HardReset => self.hard_reset(&fetched),
        }
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("repository has no working directory (bare repo?)"))
    }
}
