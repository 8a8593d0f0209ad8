//! # Storage Layer
//!
//! Persistence for worklog projects in plain, line-oriented files.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSONL (one record per line) | `.worklog/items.jsonl` |
//! | View history | JSONL, oldest first | `.worklog/history.jsonl` |
//! | Config | TOML | `.worklog/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`SnapshotFile`] uses file locking (`fs2`) for concurrent access
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a worklog project
//! - [`SnapshotFile`] - Read/write item records as JSONL
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod snapshot;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, DEFAULT_TIME_FORMAT};
pub use project::{Project, ProjectError, WORKLOG_DIR};
pub use snapshot::SnapshotFile;
