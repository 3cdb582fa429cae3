//! Pure data types for the deploy watcher domain.
//! No I/O - these only describe revisions and sync outcomes.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque revision identifier (a full commit hash).
/// Two revisions are equal iff they denote the same commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the working copy is brought up to date with the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Advance HEAD only if the remote tip is a descendant of it.
    /// A diverged local history is an error.
    FastForward,
    /// Force the working copy to exactly match the remote tip,
    /// discarding local commits and uncommitted modifications.
    HardReset,
}

/// Outcome of one watcher invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub before: Revision,
    pub after: Revision,
    pub restarted: bool,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn revision_short_truncates_to_seven() {
        let rev = Revision::new("0123456789abcdef");
        assert_eq!(rev.short(), "0123456");
    }

    #[test]
    fn revision_short_of_short_hash_is_whole_hash() {
        let rev = Revision::new("abc");
        assert_eq!(rev.short(), "abc");
    }

    #[test]
    fn revisions_compare_by_hash() {
        assert_eq!(Revision::new("aa"), Revision::new("aa"));
        assert_ne!(Revision::new("aa"), Revision::new("bb"));
    }

    #[test]
    fn report_changed_iff_revisions_differ() {
        let same = SyncReport {
            before: Revision::new("aa"),
            after: Revision::new("aa"),
            restarted: false,
        };
        assert!(!same.changed());

        let moved = SyncReport {
            before: Revision::new("aa"),
            after: Revision::new("bb"),
            restarted: true,
        };
        assert!(moved.changed());
    }
}
