//! sync-core: Reconciliation engine for notes mirrored onto a remote
//! issue tracker.
//!
//! This crate provides the core functionality for:
//! - Model types shared by both stores (`Note`, `RemoteIssue`, `Status`)
//! - The `NoteStore` and `IssueTracker` adapter traits
//! - The push/pull reconciliation passes

pub mod model;
pub mod store;
pub mod sync;
pub mod tracker;

pub use model::{Fingerprint, Note, RemoteIssue, Status};
pub use store::{InMemoryStore, NoteStore, StoreError};
pub use sync::{PullReport, PushAction, PushReport, SyncError, plan_push, pull, push};
pub use tracker::{InMemoryTracker, IssueTracker, TrackerError};
