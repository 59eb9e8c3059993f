//! On-disk configuration: remote repository coordinates, access token,
//! and the notes directory location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".jot";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Remote repository name
    #[serde(default)]
    pub repo: String,

    /// Access token for the tracker API
    #[serde(default)]
    pub token: String,

    /// Directory holding the active note files
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,
}

fn default_notes_dir() -> String {
    "notes".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            notes_dir: default_notes_dir(),
        }
    }
}

impl Config {
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load the config, failing when the repository is not initialized.
    pub fn load_from(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);
        if !path.exists() {
            bail!("not a jot repository; run `jot init` first");
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&content).context("failed to parse config.json")?;
        Ok(config)
    }

    pub fn save_to(&self, root: &Path) -> Result<()> {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;

        let path = Self::file_path(root);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new("."))
    }

    /// Remote coordinates, checked up front so the common operator
    /// mistakes (unlinked repository, missing token) surface clearly
    /// before any network traffic.
    pub fn remote(&self) -> Result<(&str, &str, &str)> {
        if self.owner.is_empty() || self.repo.is_empty() {
            bail!("no remote repository linked; run `jot link <owner> <repo>` first");
        }
        Ok((&self.owner, &self.repo, &self.token))
    }
}
