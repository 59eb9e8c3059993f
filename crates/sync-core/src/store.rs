//! NoteStore trait abstraction for the local side of the sync.
//!
//! Implementations:
//! - `InMemoryStore` - for engine tests
//! - `FileNoteStore` (in note-fs) - markdown files under a notes directory

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::Note;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note {0} not found")]
    NotFound(u64),

    #[error("malformed note file {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("storage error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Local note store: one active record per note id, plus an archive area
/// that receives a copy of every explicitly deleted note.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All active notes, sorted ascending by id.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Read a single note.
    async fn read(&self, id: u64) -> Result<Note>;

    /// Create or overwrite the record for `note.id`.
    async fn write(&self, note: &Note) -> Result<()>;

    /// Next id for a new note: `max(existing) + 1`, or 1 when the store is
    /// empty. Deleting the highest note frees its id for reissue, so a new
    /// note can legally reuse a number that was already pushed remotely.
    async fn allocate_id(&self) -> Result<u64>;

    /// Copy the note into the archive area, then remove it from the
    /// active set. This is the delete semantics for user-facing deletion;
    /// the archive is never consulted by sync.
    async fn archive_and_remove(&self, id: u64) -> Result<()>;

    /// Remove a note from the active set without archiving. Pull uses
    /// this to replace the local set with the remote snapshot.
    async fn remove(&self, id: u64) -> Result<()>;
}

/// In-memory store for engine tests.
pub struct InMemoryStore {
    notes: RwLock<HashMap<u64, Note>>,
    archived: RwLock<Vec<Note>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(HashMap::new()),
            archived: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the active set, sorted by id.
    pub fn snapshot(&self) -> Vec<Note> {
        let notes = self.notes.read().unwrap();
        let mut all: Vec<Note> = notes.values().cloned().collect();
        all.sort_by_key(|n| n.id);
        all
    }

    /// Notes that went through `archive_and_remove`.
    pub fn archived(&self) -> Vec<Note> {
        self.archived.read().unwrap().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Note>> {
        Ok(self.snapshot())
    }

    async fn read(&self, id: u64) -> Result<Note> {
        let notes = self.notes.read().unwrap();
        notes.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn write(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write().unwrap();
        notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn allocate_id(&self) -> Result<u64> {
        let notes = self.notes.read().unwrap();
        Ok(notes.keys().max().copied().unwrap_or(0) + 1)
    }

    async fn archive_and_remove(&self, id: u64) -> Result<()> {
        let mut notes = self.notes.write().unwrap();
        let note = notes.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.archived.write().unwrap().push(note);
        Ok(())
    }

    async fn remove(&self, id: u64) -> Result<()> {
        let mut notes = self.notes.write().unwrap();
        notes.remove(&id).ok_or(StoreError::NotFound(id))?;
        Ok(())
    }
}
