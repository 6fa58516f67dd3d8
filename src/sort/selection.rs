//! Age cutoff and count cap over an already-prioritized update list

use crate::domain::PackageUpdateSet;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Filters a prioritized update list down to what one run may apply
#[derive(Debug, Clone)]
pub struct UpdateSelection {
    /// Minimum time a candidate must have been published for
    pub minimum_age: Duration,
    /// Maximum number of updates applied per repository per run
    pub max_package_updates: usize,
}

impl UpdateSelection {
    /// Create a selection policy
    pub fn new(minimum_age: Duration, max_package_updates: usize) -> Self {
        Self {
            minimum_age,
            max_package_updates,
        }
    }

    /// Apply the age filter then the count cap, preserving order
    ///
    /// A candidate with an unknown publish date always passes the age
    /// filter.
    pub fn select(
        &self,
        candidates: Vec<PackageUpdateSet>,
        now: DateTime<Utc>,
    ) -> Vec<PackageUpdateSet> {
        let candidate_count = candidates.len();

        let mut filtered = if self.minimum_age.is_zero() {
            candidates
        } else {
            let cutoff = now - self.minimum_age;
            candidates
                .into_iter()
                .filter(|u| match u.selected().published {
                    Some(published) => published <= cutoff,
                    None => true,
                })
                .collect()
        };

        let filtered_count = filtered.len();
        filtered.truncate(self.max_package_updates);

        info!(
            "selected {} updates out of {} candidates ({} passed the age filter, cap is {})",
            filtered.len(),
            candidate_count,
            filtered_count,
            self.max_package_updates
        );

        filtered
    }
}
