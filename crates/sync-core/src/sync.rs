//! Push/pull reconciliation between a local note store and a remote
//! issue tracker.
//!
//! Both passes read a full snapshot of each side first, then walk the id
//! space in ascending order, issuing one mutation per divergent id:
//!
//! - Push treats local state as authoritative: missing remote ids are
//!   created, changed content is updated, and a locally deleted note
//!   closes its remote issue.
//! - Pull treats remote state as authoritative: every remote issue (open
//!   or closed) materializes as a local note, and local notes with no
//!   remote counterpart are removed.
//!
//! Neither pass keeps state between runs. A failed run leaves the stores
//! partially reconciled; re-running converges because both passes are
//! idempotent.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Note, RemoteIssue};
use crate::store::{NoteStore, StoreError};
use crate::tracker::{IssueTracker, TrackerError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    #[error("remote tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Classification of one id during a push pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAction {
    /// No remote issue with this id: create one from the local note.
    Create(Note),
    /// Remote content differs from the local note: overwrite title/body.
    Update(Note),
    /// Content matches: no remote call is made.
    Unchanged(u64),
    /// The local note is gone but the remote issue is still open.
    Close(u64),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub created: u64,
    pub updated: u64,
    pub closed: u64,
    pub unchanged: u64,
}

impl std::fmt::Display for PushReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "push: {} created, {} updated, {} closed, {} unchanged",
            self.created, self.updated, self.closed, self.unchanged
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub written: u64,
    pub removed: u64,
    pub unchanged: u64,
}

impl std::fmt::Display for PullReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pull: {} written, {} removed, {} unchanged",
            self.written, self.removed, self.unchanged
        )
    }
}

/// Classify every id present on either side, in ascending order.
///
/// Each id falls into exactly one case: remote-absent notes are created,
/// fingerprint mismatches are updated, matches are left alone, and ids
/// that exist only as an open remote issue are closed. A remote issue
/// that is already closed and has no local note needs nothing.
///
/// Creation order matters: ids only line up across the two stores when
/// first-time pushes happen ascending against an empty remote history,
/// so the plan preserves ascending order throughout.
pub fn plan_push(local: &[Note], remote: &[RemoteIssue]) -> Vec<PushAction> {
    let local_by_id: BTreeMap<u64, &Note> = local.iter().map(|n| (n.id, n)).collect();
    let remote_by_id: BTreeMap<u64, &RemoteIssue> = remote.iter().map(|i| (i.id, i)).collect();

    let ids: BTreeSet<u64> = local_by_id
        .keys()
        .chain(remote_by_id.keys())
        .copied()
        .collect();

    let mut plan = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(note) = local_by_id.get(&id) {
            match remote_by_id.get(&id) {
                None => plan.push(PushAction::Create((*note).clone())),
                Some(issue) if note.fingerprint() == issue.fingerprint() => {
                    plan.push(PushAction::Unchanged(id))
                }
                Some(_) => plan.push(PushAction::Update((*note).clone())),
            }
        } else if let Some(issue) = remote_by_id.get(&id) {
            if issue.state.is_open() {
                plan.push(PushAction::Close(id));
            }
        }
    }
    plan
}

/// Run a push pass: fetch the remote snapshot first, plan against the
/// local snapshot, then execute one blocking call per divergent id.
pub async fn push<S, T>(store: &S, tracker: &T) -> Result<PushReport>
where
    S: NoteStore + ?Sized,
    T: IssueTracker + ?Sized,
{
    // Remote state is read before any decision so the plan never acts on
    // stale information.
    let remote = tracker.list(true).await?;
    let local = store.list().await?;

    let plan = plan_push(&local, &remote);
    debug!("push plan: {} action(s)", plan.len());

    let mut report = PushReport::default();
    for action in plan {
        match action {
            PushAction::Create(note) => {
                let issue = tracker.create(&note.title, &note.body).await?;
                info!("created issue #{} for note {}", issue.id, note.id);
                report.created += 1;
            }
            PushAction::Update(note) => {
                tracker.update(note.id, &note.title, &note.body).await?;
                info!("updated issue #{}", note.id);
                report.updated += 1;
            }
            PushAction::Unchanged(id) => {
                debug!("note {} unchanged", id);
                report.unchanged += 1;
            }
            PushAction::Close(id) => {
                tracker.close(id).await?;
                info!("closed issue #{}", id);
                report.closed += 1;
            }
        }
    }
    Ok(report)
}

/// Run a pull pass: replace the entire local active set with the remote
/// snapshot, closed issues included.
///
/// Local notes with no remote counterpart are removed without archiving;
/// the archive area belongs to explicit deletion only. Notes already
/// identical to their remote issue are not rewritten, which keeps the
/// local store byte-identical across repeated pulls.
pub async fn pull<S, T>(store: &S, tracker: &T) -> Result<PullReport>
where
    S: NoteStore + ?Sized,
    T: IssueTracker + ?Sized,
{
    let remote = tracker.list(true).await?;
    let local = store.list().await?;
    let local_by_id: BTreeMap<u64, Note> = local.into_iter().map(|n| (n.id, n)).collect();

    let mut report = PullReport::default();
    let mut remote_ids = BTreeSet::new();
    for issue in &remote {
        remote_ids.insert(issue.id);
        let note = Note {
            id: issue.id,
            title: issue.title.clone(),
            body: issue.body.trim().to_string(),
            status: issue.state,
            created: Some(issue.created_at.clone()),
        };
        if local_by_id.get(&issue.id) == Some(&note) {
            report.unchanged += 1;
            continue;
        }
        store.write(&note).await?;
        info!("pulled issue #{}: {}", note.id, note.title);
        report.written += 1;
    }

    for id in local_by_id.keys() {
        if !remote_ids.contains(id) {
            store.remove(*id).await?;
            info!("removed note {} (no remote counterpart)", id);
            report.removed += 1;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use crate::store::InMemoryStore;
    use crate::tracker::InMemoryTracker;

    fn note(id: u64, title: &str, body: &str) -> Note {
        Note {
            id,
            title: title.to_string(),
            body: body.to_string(),
            status: Status::Open,
            created: None,
        }
    }

    #[tokio::test]
    async fn push_creates_remote_issues_in_ascending_id_order() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        for id in 1..=3 {
            store.write(&note(id, &format!("note {}", id), "body")).await.unwrap();
        }

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(report.created, 3);
        // Ascending first-push order onto an empty tracker keeps the two
        // id spaces aligned.
        let ids: Vec<u64> = tracker.snapshot().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn push_creates_only_the_missing_note() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        for id in 1..=3 {
            store.write(&note(id, &format!("note {}", id), "body")).await.unwrap();
        }
        tracker.seed_open(1, "note 1", "body");
        tracker.seed_open(2, "note 2", "body");

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.unchanged, 2);
        assert_eq!(tracker.snapshot().len(), 3);
        assert_eq!(tracker.snapshot()[2].title, "note 3");
    }

    #[tokio::test]
    async fn push_updates_changed_content_without_touching_state() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        store.write(&note(1, "title", "new body")).await.unwrap();
        tracker.seed_open(1, "title", "old body");
        tracker.close(1).await.unwrap();
        let before = tracker.mutation_count();

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(report.updated, 1);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot[0].body, "new body");
        // A content update never reopens a closed issue.
        assert_eq!(snapshot[0].state, Status::Closed);
        assert_eq!(tracker.mutation_count(), before + 1);
    }

    #[tokio::test]
    async fn push_closes_remote_issue_for_deleted_local_note() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        store.write(&note(1, "one", "body")).await.unwrap();
        store.write(&note(3, "three", "body")).await.unwrap();
        tracker.seed_open(1, "one", "body");
        tracker.seed_open(2, "two", "body");
        tracker.seed_open(3, "three", "body");

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(report.closed, 1);
        assert_eq!(report.unchanged, 2);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot[1].id, 2);
        assert_eq!(snapshot[1].state, Status::Closed);
    }

    #[tokio::test]
    async fn push_leaves_closed_remote_without_local_alone() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "gone", "body");
        tracker.close(1).await.unwrap();
        let before = tracker.mutation_count();

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(report, PushReport::default());
        assert_eq!(tracker.mutation_count(), before);
    }

    #[tokio::test]
    async fn push_twice_performs_zero_mutations_the_second_time() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        store.write(&note(1, "one", "body")).await.unwrap();
        store.write(&note(2, "two", "body")).await.unwrap();

        push(&store, &tracker).await.unwrap();
        let after_first = tracker.mutation_count();

        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(tracker.mutation_count(), after_first);
        assert_eq!(report.created + report.updated + report.closed, 0);
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn plan_classifies_each_id_exactly_once() {
        let local = vec![
            note(1, "unchanged", "same"),
            note(2, "changed", "new"),
            note(5, "fresh", "body"),
        ];
        let remote = vec![
            RemoteIssue {
                id: 1,
                title: "unchanged".to_string(),
                body: "same".to_string(),
                state: Status::Open,
                created_at: String::new(),
                updated_at: String::new(),
            },
            RemoteIssue {
                id: 2,
                title: "changed".to_string(),
                body: "old".to_string(),
                state: Status::Open,
                created_at: String::new(),
                updated_at: String::new(),
            },
            RemoteIssue {
                id: 3,
                title: "deleted locally".to_string(),
                body: String::new(),
                state: Status::Open,
                created_at: String::new(),
                updated_at: String::new(),
            },
            RemoteIssue {
                id: 4,
                title: "already closed".to_string(),
                body: String::new(),
                state: Status::Closed,
                created_at: String::new(),
                updated_at: String::new(),
            },
        ];

        let plan = plan_push(&local, &remote);

        assert_eq!(
            plan,
            vec![
                PushAction::Unchanged(1),
                PushAction::Update(local[1].clone()),
                PushAction::Close(3),
                PushAction::Create(local[2].clone()),
            ]
        );
    }

    #[tokio::test]
    async fn pull_materializes_open_and_closed_issues() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "first", "body one");
        tracker.seed_open(2, "second", "body two");
        tracker.close(2).await.unwrap();

        let report = pull(&store, &tracker).await.unwrap();

        assert_eq!(report.written, 2);
        let notes = store.snapshot();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].status, Status::Open);
        assert_eq!(notes[1].status, Status::Closed);
        assert_eq!(notes[1].title, "second");
    }

    #[tokio::test]
    async fn pull_removes_local_notes_without_remote_counterpart() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        store.write(&note(5, "local only", "body")).await.unwrap();
        tracker.seed_open(1, "remote", "body");

        let report = pull(&store, &tracker).await.unwrap();

        assert_eq!(report.removed, 1);
        let notes = store.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, 1);
        // Removal by pull bypasses the archive.
        assert!(store.archived().is_empty());
    }

    #[tokio::test]
    async fn pull_twice_changes_nothing() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "stable", "body");

        pull(&store, &tracker).await.unwrap();
        let first = store.snapshot();

        let report = pull(&store, &tracker).await.unwrap();

        assert_eq!(store.snapshot(), first);
        assert_eq!(report.written, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[tokio::test]
    async fn pull_then_push_performs_zero_mutations() {
        let store = InMemoryStore::new();
        let tracker = InMemoryTracker::new();
        tracker.seed_open(1, "first", "body");
        tracker.seed_open(2, "second", "other body");
        tracker.close(2).await.unwrap();
        let before = tracker.mutation_count();

        pull(&store, &tracker).await.unwrap();
        let report = push(&store, &tracker).await.unwrap();

        assert_eq!(tracker.mutation_count(), before);
        assert_eq!(report.created + report.updated + report.closed, 0);
    }
}
