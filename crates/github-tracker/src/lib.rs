//! GitHub Issues client for the remote side of the sync.
//!
//! Speaks the REST issues API: list (paginated), create, edit, and
//! close. Closing is the tracker's soft delete; nothing is ever
//! hard-deleted, and closed issues stay enumerable via `state=all`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sync_core::model::{RemoteIssue, Status};
use sync_core::tracker::{IssueTracker, Result, TrackerError};

const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "jot-sync";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: usize = 100;

/// GitHub Issues API client for one repository.
pub struct GitHubTracker {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    created_at: String,
    updated_at: String,
    /// Present when the record is actually a pull request; the issues
    /// endpoint returns both.
    pull_request: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct EditIssueRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
}

fn to_remote_issue(issue: IssueResponse) -> RemoteIssue {
    RemoteIssue {
        id: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        state: if issue.state == "closed" {
            Status::Closed
        } else {
            Status::Open
        },
        created_at: issue.created_at,
        updated_at: issue.updated_at,
    }
}

impl GitHubTracker {
    /// Build a client for `owner`/`repo`.
    ///
    /// Fails up front when no token is configured, so the
    /// missing-credential case surfaces before any network traffic.
    pub fn new(owner: &str, repo: &str, token: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, owner, repo, token)
    }

    pub fn with_base_url(base_url: &str, owner: &str, repo: &str, token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(TrackerError::MissingToken);
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.base_url, self.owner, self.repo
        )
    }

    fn issue_url(&self, id: u64) -> String {
        format!("{}/{}", self.issues_url(), id)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiErrorResponse>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());

        // 401/403 are the credential-rejected class the operator needs to
        // tell apart from a missing token or an unreachable network.
        Err(match status.as_u16() {
            401 | 403 => TrackerError::AuthRejected {
                status: status.as_u16(),
                message,
            },
            _ => TrackerError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn list(&self, include_closed: bool) -> Result<Vec<RemoteIssue>> {
        let state = if include_closed { "all" } else { "open" };
        let per_page = PAGE_SIZE.to_string();

        let mut issues = Vec::new();
        let mut page = 1u32;
        loop {
            let page_param = page.to_string();
            let request = self.request(Method::GET, &self.issues_url()).query(&[
                ("state", state),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ]);
            let batch: Vec<IssueResponse> = self
                .send(request)
                .await?
                .json()
                .await
                .map_err(|e| TrackerError::Network(e.to_string()))?;

            let full_page = batch.len() == PAGE_SIZE;
            issues.extend(
                batch
                    .into_iter()
                    .filter(|i| i.pull_request.is_none())
                    .map(to_remote_issue),
            );
            if !full_page {
                break;
            }
            page += 1;
        }

        issues.sort_by_key(|i| i.id);
        debug!("listed {} remote issue(s) (state={})", issues.len(), state);
        Ok(issues)
    }

    async fn create(&self, title: &str, body: &str) -> Result<RemoteIssue> {
        let request = self
            .request(Method::POST, &self.issues_url())
            .json(&CreateIssueRequest { title, body });
        let issue: IssueResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;
        Ok(to_remote_issue(issue))
    }

    async fn update(&self, id: u64, title: &str, body: &str) -> Result<()> {
        let request = self
            .request(Method::PATCH, &self.issue_url(id))
            .json(&EditIssueRequest {
                title: Some(title),
                body: Some(body),
                state: None,
            });
        self.send(request).await?;
        Ok(())
    }

    async fn close(&self, id: u64) -> Result<()> {
        let request = self
            .request(Method::PATCH, &self.issue_url(id))
            .json(&EditIssueRequest {
                title: None,
                body: None,
                state: Some("closed"),
            });
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected_before_any_network_call() {
        let result = GitHubTracker::new("octocat", "hello-world", "");
        assert!(matches!(result, Err(TrackerError::MissingToken)));
    }

    #[test]
    fn issue_urls_are_repo_scoped() {
        let tracker =
            GitHubTracker::with_base_url("https://api.github.com/", "octocat", "notes", "t")
                .unwrap();
        assert_eq!(
            tracker.issues_url(),
            "https://api.github.com/repos/octocat/notes/issues"
        );
        assert_eq!(
            tracker.issue_url(7),
            "https://api.github.com/repos/octocat/notes/issues/7"
        );
    }

    #[test]
    fn issue_response_maps_to_remote_issue() {
        let json = r#"{
            "number": 12,
            "title": "A bug",
            "body": "It breaks.",
            "state": "open",
            "created_at": "2024-01-02T03:04:05Z",
            "updated_at": "2024-01-03T00:00:00Z"
        }"#;
        let parsed: IssueResponse = serde_json::from_str(json).unwrap();
        let issue = to_remote_issue(parsed);
        assert_eq!(issue.id, 12);
        assert_eq!(issue.state, Status::Open);
        assert_eq!(issue.body, "It breaks.");
        assert_eq!(issue.created_at, "2024-01-02T03:04:05Z");
    }

    #[test]
    fn null_body_becomes_empty_string() {
        let json = r#"{
            "number": 1,
            "title": "No body",
            "body": null,
            "state": "closed",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let parsed: IssueResponse = serde_json::from_str(json).unwrap();
        let issue = to_remote_issue(parsed);
        assert_eq!(issue.body, "");
        assert_eq!(issue.state, Status::Closed);
    }

    #[test]
    fn pull_requests_are_detectable() {
        let json = r#"{
            "number": 2,
            "title": "A PR",
            "body": "",
            "state": "open",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/2"}
        }"#;
        let parsed: IssueResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.pull_request.is_some());
    }

    #[test]
    fn edit_request_omits_unset_fields() {
        let close_only = EditIssueRequest {
            title: None,
            body: None,
            state: Some("closed"),
        };
        assert_eq!(
            serde_json::to_string(&close_only).unwrap(),
            r#"{"state":"closed"}"#
        );

        let content_only = EditIssueRequest {
            title: Some("t"),
            body: Some("b"),
            state: None,
        };
        assert_eq!(
            serde_json::to_string(&content_only).unwrap(),
            r#"{"title":"t","body":"b"}"#
        );
    }
}
