//! Model types shared by the local note store and the remote tracker.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lifecycle state of a note or issue.
///
/// The remote side never hard-deletes; `Closed` is the soft-delete state,
/// and pull materializes closed issues as visible closed notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Closed,
}

impl Status {
    pub fn is_open(self) -> bool {
        matches!(self, Status::Open)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Open => write!(f, "open"),
            Status::Closed => write!(f, "closed"),
        }
    }
}

/// A local note.
///
/// `id` is the shared key with the remote issue of the same number. The
/// pairing holds only when first-time pushes happen in ascending id order
/// against an empty remote history; nothing here verifies or repairs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub status: Status,
    /// RFC 3339 creation timestamp. Informational only; never part of the
    /// content fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Note {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.title, &self.body)
    }
}

/// One record on the remote tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub state: Status,
    pub created_at: String,
    pub updated_at: String,
}

impl RemoteIssue {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.title, &self.body)
    }
}

/// Content fingerprint used for change detection: SHA-256 over title and
/// body, with a separator byte so the boundary between the two is
/// unambiguous. Status and timestamps are excluded, so metadata-only
/// differences never trigger an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(title: &str, body: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update([0u8]);
        hasher.update(body.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
