//! Idempotency guard for resumed branches
//!
//! When a run resumes an existing update branch, updates whose commit is
//! already on the branch must not be applied again.

use crate::domain::PackageUpdateSet;
use crate::git::GitDriver;
use crate::message::CommitWorder;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drops updates already committed on the branch
pub struct ExistingCommitFilter {
    worder: Arc<dyn CommitWorder>,
}

impl ExistingCommitFilter {
    /// Create a filter phrasing would-be messages with the given worder
    pub fn new(worder: Arc<dyn CommitWorder>) -> Self {
        Self { worder }
    }

    /// Keep only updates whose commit message is not yet in the branch
    /// history between `base` and `head`
    ///
    /// Messages are compared with all whitespace stripped, so rewrapping
    /// does not defeat the guard. If the history cannot be read the filter
    /// fails open and keeps every update.
    pub fn filter(
        &self,
        git: &dyn GitDriver,
        base: &str,
        head: &str,
        updates: Vec<PackageUpdateSet>,
    ) -> Vec<PackageUpdateSet> {
        let existing = match git.get_new_commit_messages(base, head) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    "could not read commits between {} and {}, keeping all updates: {}",
                    base, head, e
                );
                return updates;
            }
        };

        if existing.is_empty() {
            return updates;
        }

        let existing: Vec<String> = existing.iter().map(|m| strip_whitespace(m)).collect();

        updates
            .into_iter()
            .filter(|update| {
                let message = strip_whitespace(&self.worder.commit_message(update));
                let already_committed = existing.contains(&message);
                if already_committed {
                    debug!("{} is already committed on {}", update, head);
                }
                !already_committed
            })
            .collect()
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
