//! Priority ordering of update sets
//!
//! Surfaces packages that are both widely inconsistent across the codebase
//! and most overdue first. Scoring is pure integer math so the order is
//! deterministic; the constants are long-standing tuning values and are
//! kept as-is.

use crate::domain::PackageUpdateSet;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Scale applied to the usage/inconsistency component
const COUNT_SCALE: i64 = 1000;

/// Weight per major version skipped
const MAJOR_WEIGHT: i64 = 100;

/// Weight per minor version skipped
const MINOR_WEIGHT: i64 = 10;

/// Bonus for an update that leaves a prerelease track
const PRERELEASE_BONUS: i64 = 1200;

/// Order update sets by descending priority score; ties keep input order
pub fn sort_by_priority(
    mut updates: Vec<PackageUpdateSet>,
    now: DateTime<Utc>,
) -> Vec<PackageUpdateSet> {
    updates.sort_by_key(|u| Reverse(score(u, now)));
    updates
}

/// Total score: usage inconsistency dominates, then change magnitude, then age
fn score(update: &PackageUpdateSet, now: DateTime<Utc>) -> i64 {
    let count_score = (update.distinct_current_versions() as i64 * COUNT_SCALE
        + update.usage_count() as i64)
        * COUNT_SCALE;

    count_score + version_change_score(update) + age_in_days(update, now)
}

/// Magnitude of the version jump, weighted by tier
fn version_change_score(update: &PackageUpdateSet) -> i64 {
    let current = update.highest_current_version();
    let new = update.selected_version();

    let bonus = if !current.pre.is_empty() && new.pre.is_empty() {
        PRERELEASE_BONUS
    } else {
        0
    };

    if new.major > current.major {
        (new.major - current.major) as i64 * MAJOR_WEIGHT + bonus
    } else if new.minor > current.minor {
        (new.minor - current.minor) as i64 * MINOR_WEIGHT + bonus
    } else if new.patch > current.patch {
        (new.patch - current.patch) as i64 + bonus
    } else {
        bonus
    }
}

/// Days since the selected candidate was published; unknown dates score zero
fn age_in_days(update: &PackageUpdateSet, now: DateTime<Utc>) -> i64 {
    update
        .selected()
        .published
        .map(|published| (now - published).num_days().max(0))
        .unwrap_or(0)
}
