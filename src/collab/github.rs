//! Source-control collaborator
//!
//! The seven operations the engine needs, all carrying an owner-bound
//! access token per call. `GitHubClient` talks to the REST API; the
//! trait is the seam handlers depend on.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, StrixError};
use crate::util::{API_TIMEOUT, CONNECT_TIMEOUT};

/// Created issue coordinates
#[derive(Debug, Clone, Deserialize)]
pub struct IssueInfo {
    pub id: u64,
    pub number: u64,
    #[serde(rename = "html_url")]
    pub url: String,
}

/// Opened pull request coordinates
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    #[serde(rename = "html_url")]
    pub url: String,
}

/// Repository operations the workflow engine consumes
#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn get_file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String>;

    async fn create_issue(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<IssueInfo>;

    /// Resolve a ref (e.g. `heads/main`) to its commit sha
    async fn get_reference(&self, token: &str, owner: &str, repo: &str, r#ref: &str)
        -> Result<String>;

    async fn create_branch(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        new_branch: &str,
        base_sha: &str,
    ) -> Result<()>;

    async fn get_file_sha(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String>;

    #[allow(clippy::too_many_arguments)]
    async fn update_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        sha: &str,
        message: &str,
        branch: &str,
    ) -> Result<()>;

    async fn create_pull_request(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestInfo>;
}

/// REST client against api.github.com
pub struct GitHubClient {
    base_url: String,
    client: Client,
}

impl GitHubClient {
    pub fn new() -> Self {
        Self::with_base_url("https://api.github.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent("strix/0.3")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn api_error(context: &str, status: reqwest::StatusCode, body: String) -> StrixError {
        StrixError::SourceControl {
            reason: format!("{context}: {status} {body}"),
        }
    }

    async fn check(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Self::api_error(context, status, body))
        }
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn get_file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let response = Self::check(response, "get file content").await?;

        #[derive(Deserialize)]
        struct FileBody {
            content: String,
        }
        let file: FileBody = response.json().await?;
        // Contents API base64 wraps lines
        let cleaned: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| StrixError::SourceControl {
                reason: format!("invalid base64 content for {path}: {e}"),
            })?;
        String::from_utf8(bytes).map_err(|e| StrixError::SourceControl {
            reason: format!("non-UTF8 content for {path}: {e}"),
        })
    }

    async fn create_issue(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<IssueInfo> {
        let url = format!("{}/repos/{owner}/{repo}/issues", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;
        let response = Self::check(response, "create issue").await?;
        Ok(response.json().await?)
    }

    async fn get_reference(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        r#ref: &str,
    ) -> Result<String> {
        let reference = r#ref;
        let url = format!("{}/repos/{owner}/{repo}/git/ref/{reference}", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let response = Self::check(response, "get reference").await?;

        let body: serde_json::Value = response.json().await?;
        body["object"]["sha"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StrixError::SourceControl {
                reason: format!("reference '{reference}' has no object sha"),
            })
    }

    async fn create_branch(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        new_branch: &str,
        base_sha: &str,
    ) -> Result<()> {
        let url = format!("{}/repos/{owner}/{repo}/git/refs", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "ref": format!("refs/heads/{new_branch}"),
                "sha": base_sha
            }))
            .send()
            .await?;
        Self::check(response, "create branch").await?;
        Ok(())
    }

    async fn get_file_sha(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/repos/{owner}/{repo}/contents/{path}?ref={branch}",
            self.base_url
        );
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let response = Self::check(response, "get file sha").await?;

        let body: serde_json::Value = response.json().await?;
        body["sha"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StrixError::SourceControl {
                reason: format!("no sha for {path}@{branch}"),
            })
    }

    async fn update_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        sha: &str,
        message: &str,
        branch: &str,
    ) -> Result<()> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&json!({
                "message": message,
                "content": BASE64.encode(content.as_bytes()),
                "sha": sha,
                "branch": branch
            }))
            .send()
            .await?;
        Self::check(response, "update file").await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestInfo> {
        let url = format!("{}/repos/{owner}/{repo}/pulls", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "body": body,
                "head": head,
                "base": base
            }))
            .send()
            .await?;
        let response = Self::check(response, "create pull request").await?;
        Ok(response.json().await?)
    }
}

/// Extract `(owner, repo)` from a `https://github.com/<owner>/<repo>` target
pub fn parse_github_target(target: &str) -> Option<(String, String)> {
    let rest = target.strip_prefix("https://github.com/")?;
    let mut parts = rest.split('/').filter(|s| !s.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Some((owner.to_string(), repo.to_string()))
}
