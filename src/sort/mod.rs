//! Ordering and selection of update sets
//!
//! This module provides:
//! - Priority scoring (usage inconsistency, change magnitude, age)
//! - Generic dependency-respecting linearization with cycle fallback
//! - Age/count-based selection over a prioritized list

mod priority;
mod selection;
pub mod topological;

pub use priority::sort_by_priority;
pub use selection::UpdateSelection;

use crate::domain::{PackageInProject, PackageUpdateSet};
use chrono::{DateTime, Utc};

/// Full ordering pass: priority first, then package dependency order
pub fn order_updates(
    updates: Vec<PackageUpdateSet>,
    now: DateTime<Utc>,
) -> Vec<PackageUpdateSet> {
    let prioritized = sort_by_priority(updates, now);
    sort_updates_by_dependencies(prioritized)
}

/// Order update sets so that a set whose candidate depends on another
/// updated package comes before it
pub fn sort_updates_by_dependencies(updates: Vec<PackageUpdateSet>) -> Vec<PackageUpdateSet> {
    topological::sort(updates, |a, b| a.depends_on(b), |u| u.id().to_string())
}

/// Order usages so projects are edited in build order: a referenced
/// project before the projects that reference it
pub fn sort_projects_for_build(usages: Vec<PackageInProject>) -> Vec<PackageInProject> {
    let mut sorted = topological::sort(
        usages,
        |a, b| a.references_project(&b.location.full_path()),
        |p| p.location.relative_path.display().to_string(),
    );
    sorted.reverse();
    sorted
}
