//! Project management
//!
//! Handles project initialization and loading/saving the item store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use thiserror::Error;

use super::{Config, SnapshotFile};
use crate::engine::{ItemRecord, ItemStore};

/// Name of the per-project data directory
pub const WORKLOG_DIR: &str = ".worklog";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a worklog project. Run 'worklog init' first.")]
    NotInProject,
}

/// A worklog project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKLOG_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left alone, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(WORKLOG_DIR);

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create {} directory: {}", WORKLOG_DIR, data_dir.display())
        })?;

        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# worklog configuration

# Number of entries kept in the view history (unbounded when unset)
# history_limit = 10

# Longest accepted duration, in minutes
# max_duration_minutes = 480

# Display format for timestamps
time_format = "%d.%m.%Y %H:%M"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Temp files left by an interrupted save
*.tmp

# View history is per user
history.jsonl
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .worklog directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(WORKLOG_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the item store
    pub fn items_file(&self) -> SnapshotFile {
        SnapshotFile::new(self.data_dir().join("items.jsonl"))
    }

    /// Snapshot of the view history, oldest first
    pub fn history_file(&self) -> SnapshotFile {
        SnapshotFile::new(self.data_dir().join("history.jsonl"))
    }

    /// Rebuilds the item store and its history from disk
    pub fn load_store(&self) -> Result<ItemStore> {
        let options = self.config.project.store_options()?;

        let items_file = self.items_file();
        let records = items_file.read_all()?;
        let mut store = ItemStore::restore(records, options)
            .with_context(|| format!("Corrupt snapshot: {}", items_file.path().display()))?;

        let history_file = self.history_file();
        let restored = store
            .restore_history(history_file.read_all()?)
            .with_context(|| format!("Corrupt history: {}", history_file.path().display()))?;

        info!(
            "Loaded {} item(s) and {} history entries from {}",
            store.len(),
            restored,
            self.data_dir().display()
        );
        Ok(store)
    }

    /// Writes the item store and its history to disk
    pub fn save_store(&self, store: &ItemStore) -> Result<()> {
        self.items_file().write_all(&store.snapshot())?;

        let history: Vec<ItemRecord> = store.history().iter().map(ItemRecord::from).collect();
        self.history_file().write_all(&history)?;

        info!("Saved {} item(s) to {}", store.len(), self.data_dir().display());
        Ok(())
    }
}
