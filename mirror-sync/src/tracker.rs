//! Tracker client seam.
//!
//! [`TrackerClient`] is the only way the engine talks to the external
//! tracker. Every method is an awaited I/O boundary; the engine never issues
//! two calls concurrently from one upsert.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mirror_core::{ExternalId, Repository};

use crate::error::TrackerError;

/// Structured search request. Clients translate it into their own query
/// language; see [`SearchQuery::to_github_query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchQuery {
    /// Resources whose body contains the exact marker token.
    BodyMarker(String),
    /// Resources carrying the exact label.
    Label(String),
    /// Free keyword search over title and body.
    Keyword(String),
}

impl SearchQuery {
    /// GitHub issue search syntax scoped to `repo`.
    pub fn to_github_query(&self, repo: &Repository) -> String {
        let scope = format!("repo:{repo} is:issue");
        match self {
            SearchQuery::BodyMarker(marker) => {
                format!("{scope} in:body \"{}\"", escape_quotes(marker))
            }
            SearchQuery::Label(label) => format!("{scope} label:\"{}\"", escape_quotes(label)),
            SearchQuery::Keyword(text) => {
                format!("{scope} in:title,body \"{}\"", escape_quotes(text))
            }
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::BodyMarker(m) => write!(f, "body:{m}"),
            SearchQuery::Label(l) => write!(f, "label:{l}"),
            SearchQuery::Keyword(k) => write!(f, "keyword:{k}"),
        }
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ExternalId,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Payload for [`TrackerClient::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Identity of a created or updated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: ExternalId,
    pub url: String,
}

/// Open/closed state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Current view of a resource as returned by [`TrackerClient::get`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub id: ExternalId,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub state: IssueState,
}

/// Operations consumed from the tracker client collaborator.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, TrackerError>;

    async fn create(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError>;

    async fn update(&self, id: ExternalId, update: &IssueUpdate) -> Result<IssueRef, TrackerError>;

    async fn get(&self, id: ExternalId) -> Result<IssueSnapshot, TrackerError>;

    /// Name of this client for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_query_scopes_repo_and_escapes_quotes() {
        let repo: Repository = "acme/workflow".parse().unwrap();
        let q = SearchQuery::Keyword("say \"hi\"".into()).to_github_query(&repo);
        assert_eq!(q, r#"repo:acme/workflow is:issue in:title,body "say \"hi\"""#);
        let q = SearchQuery::Label("canonical:I-1".into()).to_github_query(&repo);
        assert_eq!(q, r#"repo:acme/workflow is:issue label:"canonical:I-1""#);
    }

    #[test]
    fn issue_update_skips_absent_fields() {
        let update = IssueUpdate {
            labels: Some(vec!["a".into()]),
            ..IssueUpdate::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"labels":["a"]}"#);
    }
}
