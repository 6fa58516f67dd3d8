//! Commit and pull request wording
//!
//! This module provides:
//! - The `CommitWorder` trait used by the updater to phrase commits and PRs
//! - The default wording, stable enough to serve as an idempotency key

use crate::domain::PackageUpdateSet;

/// Phrases commit messages, PR titles and PR bodies for a set of updates
///
/// Commit messages double as the idempotency key on branch resume, so an
/// implementation must produce the same message for the same update.
pub trait CommitWorder: Send + Sync {
    /// Message for the commit applying one update
    fn commit_message(&self, update: &PackageUpdateSet) -> String;

    /// Title for a pull request covering the given updates
    fn pr_title(&self, updates: &[PackageUpdateSet]) -> String;

    /// Markdown body for a pull request covering the given updates
    fn pr_body(&self, updates: &[PackageUpdateSet]) -> String;
}

/// The stock wording
pub struct DefaultCommitWorder;

impl CommitWorder for DefaultCommitWorder {
    fn commit_message(&self, update: &PackageUpdateSet) -> String {
        format!(
            "Automatic update of {} to {}",
            update.id(),
            update.selected_version()
        )
    }

    fn pr_title(&self, updates: &[PackageUpdateSet]) -> String {
        match updates {
            [single] => self.commit_message(single),
            many => format!("Automatic update of {} packages", many.len()),
        }
    }

    fn pr_body(&self, updates: &[PackageUpdateSet]) -> String {
        let mut body = String::new();

        if updates.len() > 1 {
            body.push_str(&format!(
                "{} packages were updated:\n\n",
                updates.len()
            ));
        }

        for update in updates {
            body.push_str(&describe_update(update));
            body.push('\n');
        }

        body.push_str("\nThis is an automated update. Merge only if it passes tests.\n");
        body
    }
}

/// One update's section of a PR body
fn describe_update(update: &PackageUpdateSet) -> String {
    let mut text = format!(
        "## {} {} to {}\n\n",
        update.id(),
        update.highest_current_version(),
        update.selected_version()
    );

    if let Some(published) = update.selected().published {
        text.push_str(&format!(
            "`{}` was published on {}.\n",
            update.selected_version(),
            published.format("%Y-%m-%d")
        ));
    }

    text.push_str(&format!(
        "\n{} usage{} updated:\n",
        update.usage_count(),
        if update.usage_count() == 1 { "" } else { "s" }
    ));
    for package in update.current_packages() {
        text.push_str(&format!(
            "- `{}` in `{}`\n",
            package.version,
            package.location.relative_path.display()
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        PackageIdentity, PackageInProject, PackageLocation, PackageLookupResult,
        PackageSearchMetadata, PackageSource, ReferenceFormat, VersionChange,
    };
    use chrono::{TimeZone, Utc};
    use semver::Version;

    fn update(id: &str, from: &str, to: &str, paths: &[&str]) -> PackageUpdateSet {
        let usages = paths
            .iter()
            .map(|path| {
                PackageInProject::new(
                    id,
                    Version::parse(from).unwrap(),
                    PackageLocation::new("/repo", *path, ReferenceFormat::ProjectFile),
                )
            })
            .collect();
        let meta = PackageSearchMetadata::new(
            PackageIdentity::new(id, Version::parse(to).unwrap()),
            PackageSource::new("https://feed.test/v3"),
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()),
            Vec::new(),
        );
        let lookup = PackageLookupResult::new(VersionChange::Major, Some(meta), None, None, None);
        PackageUpdateSet::new(usages, lookup).unwrap()
    }

    #[test]
    fn test_commit_message() {
        let worder = DefaultCommitWorder;
        let msg = worder.commit_message(&update("foo", "1.0.0", "2.1.0", &["a.csproj"]));
        assert_eq!(msg, "Automatic update of foo to 2.1.0");
    }

    #[test]
    fn test_single_update_pr_title_matches_commit_message() {
        let worder = DefaultCommitWorder;
        let updates = vec![update("foo", "1.0.0", "2.1.0", &["a.csproj"])];
        assert_eq!(worder.pr_title(&updates), "Automatic update of foo to 2.1.0");
    }

    #[test]
    fn test_multi_update_pr_title_counts_packages() {
        let worder = DefaultCommitWorder;
        let updates = vec![
            update("foo", "1.0.0", "2.0.0", &["a.csproj"]),
            update("bar", "3.0.0", "3.1.0", &["a.csproj"]),
        ];
        assert_eq!(worder.pr_title(&updates), "Automatic update of 2 packages");
    }

    #[test]
    fn test_pr_body_lists_usages_and_publish_date() {
        let worder = DefaultCommitWorder;
        let updates = vec![update("foo", "1.0.0", "2.1.0", &["a.csproj", "b/c.csproj"])];
        let body = worder.pr_body(&updates);

        assert!(body.contains("## foo 1.0.0 to 2.1.0"));
        assert!(body.contains("published on 2026-03-14"));
        assert!(body.contains("2 usages updated:"));
        assert!(body.contains("- `1.0.0` in `a.csproj`"));
        assert!(body.contains("- `1.0.0` in `b/c.csproj`"));
    }
}
