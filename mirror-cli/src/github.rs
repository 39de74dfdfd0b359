//! GitHub REST tracker client.
//!
//! `ureq` is blocking, so each request runs on tokio's blocking pool. No
//! retries happen here: failures are mapped onto [`TrackerError`] with the
//! HTTP status and remaining rate-limit quota, and the engine classifies them.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use mirror_core::{ExternalId, MirrorConfig, Repository};
use mirror_sync::{
    Candidate, IssueRef, IssueSnapshot, IssueState, IssueUpdate, NewIssue, SearchQuery,
    TrackerClient, TrackerError,
};

const USER_AGENT: &str = concat!("mirror/", env!("CARGO_PKG_VERSION"));
const SEARCH_PAGE_SIZE: &str = "100";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GithubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubIssue {
    number: u64,
    html_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<GithubLabel>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    pull_request: Option<Value>,
}

impl GithubIssue {
    fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }

    fn into_candidate(self) -> Candidate {
        Candidate {
            id: ExternalId(self.number),
            labels: self.label_names(),
            url: self.html_url,
            title: self.title,
            body: self.body,
        }
    }

    fn into_snapshot(self) -> IssueSnapshot {
        let state = if self.state.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        };
        IssueSnapshot {
            id: ExternalId(self.number),
            labels: self.label_names(),
            url: self.html_url,
            title: self.title,
            body: self.body.unwrap_or_default(),
            state,
        }
    }

    fn issue_ref(&self) -> IssueRef {
        IssueRef {
            id: ExternalId(self.number),
            url: self.html_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GithubIssue>,
}

/// GitHub error payload: `{"message": "...", "errors": [...]}`.
#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<Value>,
}

impl GithubErrorBody {
    /// Top-level message followed by each nested error's message or code.
    fn describe(&self) -> String {
        let details: Vec<String> = self
            .errors
            .iter()
            .filter_map(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map
                    .get("message")
                    .or_else(|| map.get("code"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect();
        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.message, details.join("; "))
        }
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_ureq_error(err: ureq::Error) -> TrackerError {
    match err {
        ureq::Error::Status(status, response) => {
            let rate_limit_remaining = response
                .header("x-ratelimit-remaining")
                .and_then(|v| v.trim().parse().ok());
            let message = response
                .into_json::<GithubErrorBody>()
                .map(|body| body.describe())
                .unwrap_or_else(|_| format!("HTTP {status}"));
            TrackerError::Http {
                status,
                message,
                rate_limit_remaining,
            }
        }
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            let timed_out = message.to_ascii_lowercase().contains("timed out");
            TrackerError::Transport { message, timed_out }
        }
    }
}

/// Run a blocking request on the blocking pool and decode its JSON body.
async fn execute<T, F>(send: F) -> Result<T, TrackerError>
where
    T: DeserializeOwned + Send + 'static,
    F: FnOnce() -> Result<ureq::Response, ureq::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let response = send().map_err(map_ureq_error)?;
        response
            .into_json::<T>()
            .map_err(|e| TrackerError::Decode(format!("unexpected response body: {e}")))
    })
    .await
    .map_err(|e| TrackerError::Transport {
        message: format!("request task failed: {e}"),
        timed_out: false,
    })?
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Issue tracker backed by the GitHub REST API.
pub struct GithubTracker {
    agent: ureq::Agent,
    api_base_url: String,
    repository: Repository,
    token: Option<String>,
}

impl GithubTracker {
    /// Build a client from config; the token is read from `config.token_env`.
    pub fn from_config(config: &MirrorConfig) -> Self {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(config, token)
    }

    pub fn new(config: &MirrorConfig, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn issues_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues",
            self.repository.owner, self.repository.name
        )
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, &format!("{}{path}", self.api_base_url))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28")
            .set("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

#[async_trait]
impl TrackerClient for GithubTracker {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, TrackerError> {
        let q = query.to_github_query(&self.repository);
        tracing::debug!(query = %q, "searching issues");
        let request = self
            .request("GET", "/search/issues")
            .query("q", &q)
            .query("per_page", SEARCH_PAGE_SIZE);
        let response: SearchResponse = execute(move || request.call()).await?;
        Ok(response
            .items
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(GithubIssue::into_candidate)
            .collect())
    }

    async fn create(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError> {
        let request = self.request("POST", &self.issues_path());
        let payload = json!({
            "title": issue.title,
            "body": issue.body,
            "labels": issue.labels,
        });
        let created: GithubIssue = execute(move || request.send_json(payload)).await?;
        Ok(created.issue_ref())
    }

    async fn update(&self, id: ExternalId, update: &IssueUpdate) -> Result<IssueRef, TrackerError> {
        let request = self.request("PATCH", &format!("{}/{}", self.issues_path(), id.0));
        let payload = serde_json::to_value(update)
            .map_err(|e| TrackerError::Decode(format!("cannot encode update: {e}")))?;
        let updated: GithubIssue = execute(move || request.send_json(payload)).await?;
        Ok(updated.issue_ref())
    }

    async fn get(&self, id: ExternalId) -> Result<IssueSnapshot, TrackerError> {
        let request = self.request("GET", &format!("{}/{}", self.issues_path(), id.0));
        let issue: GithubIssue = execute(move || request.call()).await?;
        Ok(issue.into_snapshot())
    }

    fn name(&self) -> &str {
        "github"
    }
}
