//! Version source clients
//!
//! A `SourceClient` answers "which versions of this package exist" for one
//! configured feed. The HTTP implementation reads a NuGet-style
//! registration index at `{feed}/{lowercase-id}/index.json` carrying
//! version, publish timestamp and declared dependency ids.

use crate::domain::{
    PackageId, PackageIdentity, PackageSearchMetadata, PackageSource, PackageVersionRange,
};
use crate::error::LookupError;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default timeout for feed requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("prbump/", env!("CARGO_PKG_VERSION"));

/// Feeds mark unlisted versions with an ancient publish date; anything
/// before this year is treated as unknown
const MIN_PLAUSIBLE_PUBLISH_YEAR: i32 = 1980;

/// A client for one package version source
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// The feed this client talks to
    fn source(&self) -> &PackageSource;

    /// Fetch all known published versions of a package
    async fn get_package_versions(
        &self,
        id: &PackageId,
        include_prerelease: bool,
    ) -> Result<Vec<PackageSearchMetadata>, LookupError>;
}

/// Registration index document
#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    /// Index pages; small feeds inline their leaves
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

/// One page of the registration index
#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(default)]
    items: Vec<RegistrationLeaf>,
}

/// One published version entry
#[derive(Debug, Deserialize)]
struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: CatalogEntry,
}

/// Catalog data for one version
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    version: String,
    #[serde(default)]
    published: Option<DateTime<Utc>>,
    #[serde(rename = "dependencyGroups", default)]
    dependency_groups: Vec<DependencyGroup>,
}

/// Dependencies per target framework
#[derive(Debug, Deserialize)]
struct DependencyGroup {
    #[serde(default)]
    dependencies: Vec<CatalogDependency>,
}

/// One declared dependency
#[derive(Debug, Deserialize)]
struct CatalogDependency {
    id: String,
}

/// HTTP source client over a registration index feed
pub struct HttpSourceClient {
    client: reqwest::Client,
    source: PackageSource,
}

impl HttpSourceClient {
    /// Create a client for one feed, sharing the given reqwest client
    pub fn new(client: reqwest::Client, source: PackageSource) -> Self {
        Self { client, source }
    }

    /// Build the shared reqwest client with timeout and user-agent
    pub fn build_http_client() -> Result<reqwest::Client, LookupError> {
        reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| LookupError::ClientCreation {
                source_name: "http".to_string(),
                message: e.to_string(),
            })
    }

    fn index_url(&self, id: &PackageId) -> String {
        format!(
            "{}/{}/index.json",
            self.source.url.trim_end_matches('/'),
            id.normalized()
        )
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    fn source(&self) -> &PackageSource {
        &self.source
    }

    async fn get_package_versions(
        &self,
        id: &PackageId,
        include_prerelease: bool,
    ) -> Result<Vec<PackageSearchMetadata>, LookupError> {
        let url = self.index_url(id);
        debug!("fetching {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            LookupError::Request {
                package: id.to_string(),
                source_name: self.source.url.clone(),
                message: e.to_string(),
            }
        })?;

        // A feed that has never seen the package contributes no versions
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(LookupError::Request {
                package: id.to_string(),
                source_name: self.source.url.clone(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let index: RegistrationIndex =
            response
                .json()
                .await
                .map_err(|e| LookupError::InvalidResponse {
                    package: id.to_string(),
                    source_name: self.source.url.clone(),
                    message: format!("failed to parse JSON: {}", e),
                })?;

        Ok(metadata_from_index(
            index,
            id,
            &self.source,
            include_prerelease,
        ))
    }
}

/// Convert a parsed registration index into search metadata
///
/// Unparseable versions are silently dropped; prereleases are dropped
/// unless requested; sentinel publish dates are treated as unknown.
fn metadata_from_index(
    index: RegistrationIndex,
    id: &PackageId,
    source: &PackageSource,
    include_prerelease: bool,
) -> Vec<PackageSearchMetadata> {
    let mut found = Vec::new();
    for page in index.items {
        for leaf in page.items {
            let entry = leaf.catalog_entry;
            let Some(version) = PackageVersionRange::parse(id.clone(), entry.version.as_str())
                .single_version()
                .cloned()
            else {
                continue;
            };

            if !include_prerelease && !version.pre.is_empty() {
                continue;
            }

            let published = entry
                .published
                .filter(|p| p.year() >= MIN_PLAUSIBLE_PUBLISH_YEAR);

            let dependencies = entry
                .dependency_groups
                .iter()
                .flat_map(|g| g.dependencies.iter())
                .map(|d| PackageId::new(d.id.clone()))
                .collect();

            found.push(PackageSearchMetadata::new(
                PackageIdentity::new(id.clone(), version),
                source.clone(),
                published,
                dependencies,
            ));
        }
    }
    found
}
