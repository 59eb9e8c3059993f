//! Filesystem implementation of the `NoteStore` trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::fs;
use tracing::debug;

use sync_core::model::Note;
use sync_core::store::{NoteStore, Result, StoreError};

use crate::filename::{note_filename, parse_id};
use crate::markdown::{from_markdown, to_markdown};

/// Subdirectory that receives timestamped copies of deleted notes.
/// Hidden, so enumeration skips it.
const ARCHIVE_DIR: &str = ".archive";

/// Filesystem note store: one `<id>.<slug>.md` file per active note.
pub struct FileNoteStore {
    notes_dir: PathBuf,
}

impl FileNoteStore {
    pub fn new(notes_dir: PathBuf) -> Self {
        Self { notes_dir }
    }

    /// Create the notes directory if missing.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.notes_dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Enumerate `<id>.<slug>.md` entries, sorted ascending by id.
    async fn scan(&self) -> Result<Vec<(u64, PathBuf)>> {
        let mut entries = fs::read_dir(&self.notes_dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !name.ends_with(".md") {
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(id) = parse_id(&name) {
                found.push((id, entry.path()));
            }
        }
        found.sort_by_key(|(id, _)| *id);
        Ok(found)
    }

    /// Locate the active file for an id, if any.
    async fn find_file(&self, id: u64) -> Result<Option<PathBuf>> {
        Ok(self
            .scan()
            .await?
            .into_iter()
            .find(|(found, _)| *found == id)
            .map(|(_, path)| path))
    }

    async fn read_file(&self, id: u64, path: &Path) -> Result<Note> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        from_markdown(id, &file, &content)
    }

    /// Atomic write using temp file + rename, so a crash mid-write never
    /// leaves a truncated note behind.
    async fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
        let suffix: [u8; 8] = rand::rng().random();
        let temp_path = path.with_extension(format!("{}.tmp", hex::encode(suffix)));

        if let Err(e) = fs::write(&temp_path, content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for FileNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        for (id, path) in self.scan().await? {
            notes.push(self.read_file(id, &path).await?);
        }
        Ok(notes)
    }

    async fn read(&self, id: u64) -> Result<Note> {
        let path = self
            .find_file(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        self.read_file(id, &path).await
    }

    async fn write(&self, note: &Note) -> Result<()> {
        let target = self.notes_dir.join(note_filename(note.id, &note.title));

        // The slug is part of the filename, so a retitled note leaves a
        // stale file behind unless it is removed first.
        if let Some(existing) = self.find_file(note.id).await? {
            if existing != target {
                fs::remove_file(&existing)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        Self::atomic_write(&target, &to_markdown(note))
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!("wrote note {} to {}", note.id, target.display());
        Ok(())
    }

    async fn allocate_id(&self) -> Result<u64> {
        let max = self.scan().await?.last().map(|(id, _)| *id).unwrap_or(0);
        Ok(max + 1)
    }

    async fn archive_and_remove(&self, id: u64) -> Result<()> {
        let path = self
            .find_file(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        let archive_dir = self.notes_dir.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive_dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| id.to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let archived = archive_dir.join(format!("{}.{}Z.md", stem, stamp));

        fs::copy(&path, &archived)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!("archived note {} to {}", id, archived.display());
        Ok(())
    }

    async fn remove(&self, id: u64) -> Result<()> {
        let path = self
            .find_file(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}
