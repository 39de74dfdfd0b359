//! In-memory tracker for tests and offline runs.
//!
//! Behaves like a tracker whose backing store enforces a uniqueness
//! constraint on the canonical marker: the check and the insert happen under
//! one lock, so of N racing creates for the same marker exactly one wins and
//! the rest are rejected with a 422 "already exists". Every operation yields
//! to the scheduler first so concurrent callers actually interleave.
//!
//! Search returns newest resources first, like GitHub's default sort.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use mirror_core::ExternalId;
use mirror_renderer::extract_canonical_id;

use crate::error::{TrackerError, TrackerOp};
use crate::tracker::{
    Candidate, IssueRef, IssueSnapshot, IssueState, IssueUpdate, NewIssue, SearchQuery,
    TrackerClient,
};

const BASE_URL: &str = "https://tracker.test/issues";

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    issues: BTreeMap<ExternalId, IssueSnapshot>,
    failures: VecDeque<(TrackerOp, TrackerError)>,
    calls: Vec<TrackerOp>,
}

impl State {
    fn record(&mut self, op: TrackerOp) -> Result<(), TrackerError> {
        self.calls.push(op);
        let pos = self.failures.iter().position(|(failing, _)| *failing == op);
        match pos.and_then(|i| self.failures.remove(i)) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn insert(&mut self, issue: &NewIssue) -> IssueRef {
        self.next_id += 1;
        let id = ExternalId(self.next_id);
        let url = format!("{BASE_URL}/{}", id.0);
        self.issues.insert(
            id,
            IssueSnapshot {
                id,
                url: url.clone(),
                title: issue.title.clone(),
                body: issue.body.clone(),
                labels: issue.labels.clone(),
                state: IssueState::Open,
            },
        );
        IssueRef { id, url }
    }
}

/// Tracker held entirely in memory.
#[derive(Debug)]
pub struct InMemoryTracker {
    state: Mutex<State>,
    unique_marker: bool,
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTracker {
    /// Tracker enforcing marker uniqueness on create.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            unique_marker: true,
        }
    }

    /// Tracker accepting any create, like a plain issue tracker.
    pub fn without_uniqueness() -> Self {
        Self {
            unique_marker: false,
            ..Self::new()
        }
    }

    /// Insert a resource directly, bypassing the uniqueness constraint.
    pub async fn seed(&self, issue: NewIssue) -> IssueRef {
        self.state.lock().await.insert(&issue)
    }

    /// Fail the next call of `op` with `err`. Queued failures are consumed
    /// in order, one per matching call.
    pub async fn fail_next(&self, op: TrackerOp, err: TrackerError) {
        self.state.lock().await.failures.push_back((op, err));
    }

    pub async fn set_state(&self, id: ExternalId, state: IssueState) {
        if let Some(issue) = self.state.lock().await.issues.get_mut(&id) {
            issue.state = state;
        }
    }

    pub async fn issue(&self, id: ExternalId) -> Option<IssueSnapshot> {
        self.state.lock().await.issues.get(&id).cloned()
    }

    pub async fn issues(&self) -> Vec<IssueSnapshot> {
        self.state.lock().await.issues.values().cloned().collect()
    }

    /// Operations received so far, in order.
    pub async fn calls(&self) -> Vec<TrackerOp> {
        self.state.lock().await.calls.clone()
    }

    pub async fn count_calls(&self, op: TrackerOp) -> usize {
        self.state.lock().await.calls.iter().filter(|c| **c == op).count()
    }
}

fn matches(issue: &IssueSnapshot, query: &SearchQuery) -> bool {
    match query {
        SearchQuery::BodyMarker(marker) => issue.body.contains(marker.as_str()),
        SearchQuery::Label(label) => issue.labels.iter().any(|l| l == label),
        SearchQuery::Keyword(text) => issue.title.contains(text.as_str()) || issue.body.contains(text.as_str()),
    }
}

#[async_trait]
impl TrackerClient for InMemoryTracker {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, TrackerError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.record(TrackerOp::Search)?;
        Ok(state
            .issues
            .values()
            .rev()
            .filter(|issue| matches(issue, query))
            .map(|issue| Candidate {
                id: issue.id,
                url: issue.url.clone(),
                title: issue.title.clone(),
                body: Some(issue.body.clone()),
                labels: issue.labels.clone(),
            })
            .collect())
    }

    async fn create(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.record(TrackerOp::Create)?;
        if self.unique_marker {
            if let Some(id) = extract_canonical_id(&issue.body) {
                let taken = state
                    .issues
                    .values()
                    .any(|existing| extract_canonical_id(&existing.body).as_ref() == Some(&id));
                if taken {
                    return Err(TrackerError::http(
                        422,
                        format!("Validation Failed: issue for canonical id {id} already exists"),
                    ));
                }
            }
        }
        Ok(state.insert(issue))
    }

    async fn update(&self, id: ExternalId, update: &IssueUpdate) -> Result<IssueRef, TrackerError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.record(TrackerOp::Update)?;
        let issue = state
            .issues
            .get_mut(&id)
            .ok_or_else(|| TrackerError::http(404, "Not Found"))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        if let Some(labels) = &update.labels {
            issue.labels = labels.clone();
        }
        Ok(IssueRef {
            id,
            url: issue.url.clone(),
        })
    }

    async fn get(&self, id: ExternalId) -> Result<IssueSnapshot, TrackerError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.record(TrackerOp::Get)?;
        state
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(|| TrackerError::http(404, "Not Found"))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
