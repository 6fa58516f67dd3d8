//! GitHub over the REST v3 API
//!
//! Thin client: no retries, no pagination beyond the first page of 100
//! (a repository with more than 100 open PRs is already over any sane
//! open-PR threshold).

use super::{
    CollaborationPlatform, PlatformUser, PullRequestRequest, RepositoryDiscovery, RepositoryTarget,
};
use crate::domain::{RemoteRepository, RepositoryData};
use crate::error::PlatformError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public GitHub API root; overridable for GitHub Enterprise
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("prbump/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: OwnerResponse,
    clone_url: String,
    default_branch: String,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Serialize)]
struct NewPullBody<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Debug, Serialize)]
struct LabelsBody<'a> {
    labels: &'a [String],
}

/// GitHub collaboration API client
#[derive(Clone)]
pub struct GitHubPlatform {
    client: Client,
    api_base: String,
}

impl GitHubPlatform {
    /// Create a client against an API root with a bearer token
    pub fn new(api_base: &str, token: &str) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| PlatformError::Auth(format!("invalid token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| PlatformError::Request(format!("failed to create client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, PlatformError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Request(format!("invalid response body: {}", e)))
    }
}

/// Flags the create-PR endpoint cannot honor are logged, not dropped
fn note_unsupported_options(request: &PullRequestRequest) {
    if request.delete_branch_after_merge {
        warn!(
            "GitHub only supports deleting the branch after merge as a repository setting; \
             ignoring the per-request flag"
        );
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PlatformError::Auth(message));
    }
    Err(PlatformError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CollaborationPlatform for GitHubPlatform {
    async fn get_current_user(&self) -> Result<PlatformUser, PlatformError> {
        let user: UserResponse = self.get_json(&self.url("/user")).await?;
        debug!("authenticated as {}", user.login);
        Ok(PlatformUser { login: user.login })
    }

    async fn get_open_pull_request_count(
        &self,
        target: &RemoteRepository,
    ) -> Result<usize, PlatformError> {
        let url = self.url(&format!(
            "/repos/{}/{}/pulls?state=open&per_page={}",
            target.owner, target.name, PAGE_SIZE
        ));
        let pulls: Vec<PullResponse> = self.get_json(&url).await?;
        Ok(pulls.len())
    }

    async fn pull_request_exists(
        &self,
        target: &RemoteRepository,
        head: &str,
        base: &str,
    ) -> Result<bool, PlatformError> {
        // GitHub requires the head filter in owner:branch form
        let head = if head.contains(':') {
            head.to_string()
        } else {
            format!("{}:{}", target.owner, head)
        };
        let url = self.url(&format!(
            "/repos/{}/{}/pulls?state=open&head={}&base={}",
            target.owner, target.name, head, base
        ));
        let pulls: Vec<PullResponse> = self.get_json(&url).await?;
        Ok(!pulls.is_empty())
    }

    async fn open_pull_request(
        &self,
        target: &RemoteRepository,
        request: &PullRequestRequest,
        labels: &[String],
    ) -> Result<(), PlatformError> {
        note_unsupported_options(request);

        let url = self.url(&format!("/repos/{}/{}/pulls", target.owner, target.name));
        let body = NewPullBody {
            title: &request.title,
            body: &request.body,
            head: &request.head,
            base: &request.base,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        let response = check_status(response).await?;
        let pull: PullResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Request(format!("invalid response body: {}", e)))?;
        info!("opened pull request #{} on {}", pull.number, target);

        if !labels.is_empty() {
            let url = self.url(&format!(
                "/repos/{}/{}/issues/{}/labels",
                target.owner, target.name, pull.number
            ));
            let response = self
                .client
                .post(&url)
                .json(&LabelsBody { labels })
                .send()
                .await
                .map_err(|e| PlatformError::Request(e.to_string()))?;
            check_status(response).await?;
        }

        Ok(())
    }
}

/// Repository discovery over the GitHub API
pub struct GitHubDiscovery {
    platform: GitHubPlatform,
}

impl GitHubDiscovery {
    /// Create discovery sharing the platform's client
    pub fn new(platform: GitHubPlatform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl RepositoryDiscovery for GitHubDiscovery {
    async fn get_repositories(
        &self,
        target: &RepositoryTarget,
    ) -> Result<Vec<RepositoryData>, PlatformError> {
        match target {
            RepositoryTarget::Repository { owner, name } => {
                let url = self.platform.url(&format!("/repos/{}/{}", owner, name));
                let repo: RepoResponse = self.platform.get_json(&url).await?;
                Ok(vec![repository_data(repo)])
            }
            RepositoryTarget::Organization { name } => {
                let url = self
                    .platform
                    .url(&format!("/orgs/{}/repos?per_page={}", name, PAGE_SIZE));
                let repos: Vec<RepoResponse> = self.platform.get_json(&url).await?;
                let found = repos.len();
                let repositories: Vec<RepositoryData> = repos
                    .into_iter()
                    .filter(|r| !r.archived)
                    .map(repository_data)
                    .collect();
                info!(
                    "discovered {} repositories in {} ({} after skipping archived)",
                    found,
                    name,
                    repositories.len()
                );
                Ok(repositories)
            }
        }
    }
}

fn repository_data(repo: RepoResponse) -> RepositoryData {
    let remote = RemoteRepository::new(repo.owner.login, repo.name, repo.clone_url);
    RepositoryData::new(remote.clone(), remote, repo.default_branch)
}
