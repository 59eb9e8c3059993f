//! Markdown note files: YAML frontmatter plus body.
//!
//! The on-disk form is deterministic (fixed frontmatter field order,
//! trimmed body, single trailing newline), so a pull that changes
//! nothing leaves every file byte-identical.

use serde::{Deserialize, Serialize};
use sync_core::model::{Note, Status};
use sync_core::store::StoreError;

/// Frontmatter fields carried by every note file. The filename slug is
/// lossy; `title` here is the exact title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteMeta {
    pub title: String,
    pub state: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// Render a note to its on-disk form.
pub fn to_markdown(note: &Note) -> String {
    let meta = NoteMeta {
        title: note.title.clone(),
        state: note.status,
        created: note.created.clone(),
    };
    let yaml = serde_yaml::to_string(&meta).unwrap_or_default();
    format!("---\n{}---\n\n{}\n", yaml, note.body.trim())
}

/// Parse a note file back into a `Note`. `id` comes from the filename;
/// everything else comes from the frontmatter and body.
pub fn from_markdown(id: u64, file: &str, content: &str) -> Result<Note, StoreError> {
    let malformed = |reason: String| StoreError::Malformed {
        file: file.to_string(),
        reason,
    };

    let rest = content
        .strip_prefix("---\n")
        .ok_or_else(|| malformed("missing frontmatter".to_string()))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| malformed("unterminated frontmatter".to_string()))?;

    let meta: NoteMeta =
        serde_yaml::from_str(&rest[..end]).map_err(|e| malformed(e.to_string()))?;
    let body = rest[end + 4..].trim();

    Ok(Note {
        id,
        title: meta.title,
        body: body.to_string(),
        status: meta.state,
        created: meta.created,
    })
}
