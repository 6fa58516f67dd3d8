//! Branch naming

use crate::domain::PackageUpdateSet;

/// Hashes branch-name content to a short stable token
///
/// Injected so tests can pin the token; the default is FNV-1a 64.
pub trait ContentHasher: Send + Sync {
    /// Hash the content to a hex token
    fn hash(&self, content: &str) -> String;
}

/// FNV-1a, 64 bit
pub struct Fnv1a64;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl ContentHasher for Fnv1a64 {
    fn hash(&self, content: &str) -> String {
        let mut hash = FNV_OFFSET;
        for byte in content.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        format!("{:016x}", hash)
    }
}

/// Names update branches, applying the optional user template
pub struct BranchNamer {
    template: Option<String>,
    hasher: Box<dyn ContentHasher>,
}

impl BranchNamer {
    /// Create a namer with the default hasher
    pub fn new(template: Option<String>) -> Self {
        Self::with_hasher(template, Box::new(Fnv1a64))
    }

    /// Create a namer with an injected hasher
    pub fn with_hasher(template: Option<String>, hasher: Box<dyn ContentHasher>) -> Self {
        Self { template, hasher }
    }

    /// The branch name for a group of updates
    ///
    /// A single update gets a readable name; a consolidated group gets a
    /// count plus a hash of its contents so the same group always resumes
    /// the same branch.
    pub fn name(&self, updates: &[PackageUpdateSet]) -> String {
        let default = match updates {
            [single] => format!(
                "prbump-update-{}-to-{}",
                single.id().normalized(),
                single.selected_version()
            ),
            many => {
                let content: Vec<String> = many
                    .iter()
                    .map(|u| format!("{}-{}", u.id().normalized(), u.selected_version()))
                    .collect();
                format!(
                    "prbump-update-{}-packages-{}",
                    many.len(),
                    self.hasher.hash(&content.join(","))
                )
            }
        };

        match &self.template {
            Some(template) => template.replace("{default}", &default),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        PackageIdentity, PackageInProject, PackageLocation, PackageLookupResult,
        PackageSearchMetadata, PackageSource, ReferenceFormat, VersionChange,
    };
    use semver::Version;

    fn update(id: &str, to: &str) -> PackageUpdateSet {
        let usage = PackageInProject::new(
            id,
            Version::new(1, 0, 0),
            PackageLocation::new("/repo", "a.csproj", ReferenceFormat::ProjectFile),
        );
        let meta = PackageSearchMetadata::new(
            PackageIdentity::new(id, Version::parse(to).unwrap()),
            PackageSource::new("https://feed.test/v3"),
            None,
            Vec::new(),
        );
        let lookup = PackageLookupResult::new(VersionChange::Major, Some(meta), None, None, None);
        PackageUpdateSet::new(vec![usage], lookup).unwrap()
    }

    #[test]
    fn test_single_update_branch_name() {
        let namer = BranchNamer::new(None);
        assert_eq!(
            namer.name(&[update("Foo.Bar", "2.1.0")]),
            "prbump-update-foo.bar-to-2.1.0"
        );
    }

    #[test]
    fn test_multi_update_branch_name_is_stable() {
        let namer = BranchNamer::new(None);
        let updates = [update("foo", "2.0.0"), update("bar", "3.0.0")];

        let first = namer.name(&updates);
        let second = namer.name(&updates);

        assert_eq!(first, second);
        assert!(first.starts_with("prbump-update-2-packages-"));
    }

    #[test]
    fn test_multi_update_branch_name_depends_on_contents() {
        let namer = BranchNamer::new(None);
        let a = namer.name(&[update("foo", "2.0.0"), update("bar", "3.0.0")]);
        let b = namer.name(&[update("foo", "2.0.0"), update("bar", "3.1.0")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_template_wraps_default_name() {
        let namer = BranchNamer::new(Some("bot/{default}".to_string()));
        assert_eq!(
            namer.name(&[update("foo", "2.0.0")]),
            "bot/prbump-update-foo-to-2.0.0"
        );
    }

    #[test]
    fn test_fnv1a64_known_value() {
        // FNV-1a 64 of "a" per the reference vectors
        assert_eq!(Fnv1a64.hash("a"), "af63dc4c8601ec8c");
    }

    #[test]
    fn test_injected_hasher_is_used() {
        struct Fixed;
        impl ContentHasher for Fixed {
            fn hash(&self, _content: &str) -> String {
                "deadbeef".to_string()
            }
        }
        let namer = BranchNamer::with_hasher(None, Box::new(Fixed));
        let name = namer.name(&[update("foo", "2.0.0"), update("bar", "3.0.0")]);
        assert_eq!(name, "prbump-update-2-packages-deadbeef");
    }
}
