//! Framework metapackages that must never carry an explicit version

use crate::domain::PackageId;

/// The known metapackage ids, injected where exclusion happens rather than
/// read from a process-wide global
#[derive(Debug, Clone)]
pub struct Metapackages {
    ids: Vec<PackageId>,
}

impl Metapackages {
    /// Build from an explicit id list
    pub fn new(ids: Vec<PackageId>) -> Self {
        Self { ids }
    }

    /// True if the id is a metapackage
    pub fn contains(&self, id: &PackageId) -> bool {
        self.ids.iter().any(|m| m == id)
    }
}

impl Default for Metapackages {
    fn default() -> Self {
        Self::new(vec![
            PackageId::new("Microsoft.AspNetCore.App"),
            PackageId::new("Microsoft.AspNetCore.All"),
            PackageId::new("Microsoft.NETCore.App"),
        ])
    }
}
