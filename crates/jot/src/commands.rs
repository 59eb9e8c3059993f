//! Command handlers: thin glue between the CLI surface, the config, and
//! the reconciliation passes.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;

use github_tracker::GitHubTracker;
use note_fs::FileNoteStore;
use sync_core::model::{Note, Status};
use sync_core::store::NoteStore;
use sync_core::sync;
use sync_core::tracker::IssueTracker;

use crate::config::Config;

fn store(config: &Config) -> FileNoteStore {
    FileNoteStore::new(PathBuf::from(&config.notes_dir))
}

fn tracker(config: &Config) -> Result<GitHubTracker> {
    let (owner, repo, token) = config.remote()?;
    Ok(GitHubTracker::new(owner, repo, token)?)
}

pub async fn init() -> Result<()> {
    if Config::file_path(Path::new(".")).exists() {
        bail!("jot repository already initialized");
    }
    let config = Config::default();
    config.save()?;
    store(&config).init().await?;
    println!(
        "Initialized empty jot repository in {}",
        std::env::current_dir()?.display()
    );
    Ok(())
}

pub fn link(owner: &str, repo: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.owner = owner.to_string();
    config.repo = repo.to_string();
    config.save()?;
    println!("Linked to {}/{}", owner, repo);
    Ok(())
}

pub fn token(value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.token = value.to_string();
    config.save()?;
    println!("Token saved");
    Ok(())
}

pub async fn create(title: &str, body: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        bail!("title must not be empty");
    }
    let config = Config::load()?;
    let store = store(&config);

    let id = store.allocate_id().await?;
    let note = Note {
        id,
        title: title.to_string(),
        body: body.trim().to_string(),
        status: Status::Open,
        created: Some(Utc::now().to_rfc3339()),
    };
    store.write(&note).await?;
    println!("Created note #{}: {}", id, note.title);
    Ok(())
}

pub async fn delete(id: u64) -> Result<()> {
    let config = Config::load()?;
    store(&config).archive_and_remove(id).await?;
    println!("Deleted note #{} (archived copy kept)", id);
    Ok(())
}

pub async fn push() -> Result<()> {
    let config = Config::load()?;
    let store = store(&config);
    let tracker = tracker(&config)?;
    let report = sync::push(&store, &tracker).await?;
    println!("{}", report);
    Ok(())
}

pub async fn pull() -> Result<()> {
    let config = Config::load()?;
    let store = store(&config);
    let tracker = tracker(&config)?;
    let report = sync::pull(&store, &tracker).await?;
    println!("{}", report);
    Ok(())
}

pub async fn list(
    remote: bool,
    local: bool,
    open: bool,
    closed: bool,
    query: Option<&str>,
) -> Result<()> {
    let config = Config::load()?;
    let show_local = local || !remote;

    if show_local {
        let notes = store(&config).list().await?;
        for note in notes
            .iter()
            .filter(|n| keep(n.status, &n.title, &n.body, open, closed, query))
        {
            println!("#{} {} [{}]", note.id, note.title, note.status);
        }
    }

    if remote {
        let issues = tracker(&config)?.list(!open).await?;
        for issue in issues
            .iter()
            .filter(|i| keep(i.state, &i.title, &i.body, open, closed, query))
        {
            println!("#{} {} [{}]", issue.id, issue.title, issue.state);
        }
    }
    Ok(())
}

/// Shared state/substring filter for local and remote listings. The
/// query matches case-insensitively against title and body.
fn keep(status: Status, title: &str, body: &str, open: bool, closed: bool, query: Option<&str>) -> bool {
    if open && status != Status::Open {
        return false;
    }
    if closed && status != Status::Closed {
        return false;
    }
    if let Some(q) = query {
        let q = q.to_lowercase();
        if !title.to_lowercase().contains(&q) && !body.to_lowercase().contains(&q) {
            return false;
        }
    }
    true
}
