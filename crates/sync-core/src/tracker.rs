//! IssueTracker trait abstraction for the remote side of the sync.
//!
//! Implementations:
//! - `InMemoryTracker` - for engine tests
//! - `GitHubTracker` (in github-tracker) - GitHub Issues REST API

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{RemoteIssue, Status};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no access token configured; set one with `jot token <value>`")]
    MissingToken,

    #[error("tracker rejected the credential ({status}): {message}")]
    AuthRejected { status: u16, message: String },

    #[error("tracker API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Remote issue tracker.
///
/// Identifiers are assigned by the tracker in strictly increasing order
/// and are never reused; callers have no way to force a particular id.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Enumerate remote issues, sorted ascending by id.
    async fn list(&self, include_closed: bool) -> Result<Vec<RemoteIssue>>;

    /// Create a new issue. The tracker picks the id.
    async fn create(&self, title: &str, body: &str) -> Result<RemoteIssue>;

    /// Replace an issue's title and body. State is left untouched.
    async fn update(&self, id: u64, title: &str, body: &str) -> Result<()>;

    /// Transition an issue to closed. Idempotent.
    async fn close(&self, id: u64) -> Result<()>;
}

const FIXED_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

/// In-memory tracker for engine tests.
///
/// Ids come from a counter that only moves forward, matching the
/// never-reused allocation of a real tracker. Every trait call that would
/// hit the network as a mutation bumps a counter, so idempotence tests
/// can assert that a re-run performed zero remote mutations.
pub struct InMemoryTracker {
    issues: RwLock<BTreeMap<u64, RemoteIssue>>,
    next_id: RwLock<u64>,
    mutations: RwLock<u64>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self {
            issues: RwLock::new(BTreeMap::new()),
            next_id: RwLock::new(1),
            mutations: RwLock::new(0),
        }
    }

    /// Seed an issue at a specific id, advancing the allocator past it.
    pub fn seed(&self, issue: RemoteIssue) {
        let mut next_id = self.next_id.write().unwrap();
        if issue.id >= *next_id {
            *next_id = issue.id + 1;
        }
        self.issues.write().unwrap().insert(issue.id, issue);
    }

    /// Seed an open issue with the given content.
    pub fn seed_open(&self, id: u64, title: &str, body: &str) {
        self.seed(RemoteIssue {
            id,
            title: title.to_string(),
            body: body.to_string(),
            state: Status::Open,
            created_at: FIXED_TIMESTAMP.to_string(),
            updated_at: FIXED_TIMESTAMP.to_string(),
        });
    }

    /// Number of create/update/close calls seen so far.
    pub fn mutation_count(&self) -> u64 {
        *self.mutations.read().unwrap()
    }

    /// Snapshot of all issues, sorted by id.
    pub fn snapshot(&self) -> Vec<RemoteIssue> {
        self.issues.read().unwrap().values().cloned().collect()
    }

    fn record_mutation(&self) {
        *self.mutations.write().unwrap() += 1;
    }
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn list(&self, include_closed: bool) -> Result<Vec<RemoteIssue>> {
        let issues = self.issues.read().unwrap();
        Ok(issues
            .values()
            .filter(|i| include_closed || i.state.is_open())
            .cloned()
            .collect())
    }

    async fn create(&self, title: &str, body: &str) -> Result<RemoteIssue> {
        self.record_mutation();
        let mut next_id = self.next_id.write().unwrap();
        let id = *next_id;
        *next_id += 1;

        let issue = RemoteIssue {
            id,
            title: title.to_string(),
            body: body.to_string(),
            state: Status::Open,
            created_at: FIXED_TIMESTAMP.to_string(),
            updated_at: FIXED_TIMESTAMP.to_string(),
        };
        self.issues.write().unwrap().insert(id, issue.clone());
        Ok(issue)
    }

    async fn update(&self, id: u64, title: &str, body: &str) -> Result<()> {
        self.record_mutation();
        let mut issues = self.issues.write().unwrap();
        let issue = issues.get_mut(&id).ok_or(TrackerError::Api {
            status: 404,
            message: format!("issue {} not found", id),
        })?;
        issue.title = title.to_string();
        issue.body = body.to_string();
        Ok(())
    }

    async fn close(&self, id: u64) -> Result<()> {
        self.record_mutation();
        let mut issues = self.issues.write().unwrap();
        let issue = issues.get_mut(&id).ok_or(TrackerError::Api {
            status: 404,
            message: format!("issue {} not found", id),
        })?;
        issue.state = Status::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let tracker = InMemoryTracker::new();
        let a = tracker.create("a", "").await.unwrap();
        let b = tracker.create("b", "").await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn ids_are_never_reused_after_seed() {
        let tracker = InMemoryTracker::new();
        tracker.seed_open(5, "five", "");
        let next = tracker.create("six", "").await.unwrap();
        assert_eq!(next.id, 6);
    }

    #[tokio::test]
    async fn list_filters_closed() {
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "open", "");
        tracker.seed_open(2, "closing", "");
        tracker.close(2).await.unwrap();

        let open_only = tracker.list(false).await.unwrap();
        assert_eq!(open_only.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1]);

        let all = tracker.list(true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "a", "");
        tracker.close(1).await.unwrap();
        tracker.close(1).await.unwrap();
        assert_eq!(tracker.snapshot()[0].state, Status::Closed);
    }

    #[tokio::test]
    async fn mutations_are_counted() {
        let tracker = InMemoryTracker::new();
        assert_eq!(tracker.mutation_count(), 0);
        tracker.create("a", "").await.unwrap();
        tracker.update(1, "a2", "").await.unwrap();
        tracker.close(1).await.unwrap();
        assert_eq!(tracker.mutation_count(), 3);
    }
}
