//! Configuration handling for worklog
//!
//! Configuration is stored in `.worklog/config.toml` (project) and
//! `~/.config/worklog/config.toml` (global).

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::StoreOptions;

use super::project::WORKLOG_DIR;

/// Display format used when the project config does not set one
pub const DEFAULT_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Number of entries kept in the view history (unbounded when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,

    /// Longest accepted duration, in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<i64>,

    /// strftime-style format for displaying timestamps
    pub time_format: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            max_duration_minutes: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Engine options described by this config
    pub fn store_options(&self) -> Result<StoreOptions, ConfigError> {
        let history_limit = match self.history_limit {
            None => None,
            Some(limit) => Some(NonZeroUsize::new(limit).ok_or_else(|| {
                ConfigError::Invalid("history_limit must be at least 1".to_string())
            })?),
        };

        let max_duration = match self.max_duration_minutes {
            None => None,
            Some(minutes) if minutes <= 0 => {
                return Err(ConfigError::Invalid(format!(
                    "max_duration_minutes must be positive, got {}",
                    minutes
                )))
            }
            Some(minutes) => Some(Duration::try_minutes(minutes).ok_or_else(|| {
                ConfigError::Invalid(format!("max_duration_minutes is too large: {}", minutes))
            })?),
        };

        Ok(StoreOptions {
            history_limit,
            max_duration,
        })
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Output format used when `--format` is not given
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self { project, global })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "worklog", "worklog").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(WORKLOG_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse project config: {}", config_path.display()))?;

        config
            .store_options()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for `.worklog/` from the current directory up
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Finds the project root by looking for `.worklog/` from `start` up
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(WORKLOG_DIR).is_dir())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.time_format, "%d.%m.%Y %H:%M");
        assert_eq!(config.store_options().unwrap(), StoreOptions::default());
        assert_eq!(GlobalConfig::default().default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
history_limit = 10
max_duration_minutes = 480
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.history_limit, Some(10));
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);

        let options = config.store_options().unwrap();
        assert_eq!(options.history_limit, NonZeroUsize::new(10));
        assert_eq!(options.max_duration, Some(Duration::minutes(480)));
    }

    #[test]
    fn rejects_bad_limits() {
        let zero_history = ProjectConfig {
            history_limit: Some(0),
            ..ProjectConfig::default()
        };
        assert!(matches!(
            zero_history.store_options(),
            Err(ConfigError::Invalid(_))
        ));

        let negative_duration = ProjectConfig {
            max_duration_minutes: Some(-1),
            ..ProjectConfig::default()
        };
        assert!(negative_duration.store_options().is_err());
    }

    #[test]
    fn parse_global_config() {
        let config: GlobalConfig = toml::from_str(r#"default_format = "json""#).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn find_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(WORKLOG_DIR)).unwrap();
        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_project_root() {
        let dir = TempDir::new().unwrap();

        assert_ne!(
            Config::find_project_root_from(dir.path()).as_deref(),
            Some(dir.path())
        );
    }

    #[test]
    fn bad_project_config_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(WORKLOG_DIR)).unwrap();
        fs::write(
            dir.path().join(WORKLOG_DIR).join("config.toml"),
            "history_limit = 0\n",
        )
        .unwrap();

        let err = Config::for_project(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("history_limit"));
    }

    #[test]
    fn project_config_from_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(WORKLOG_DIR)).unwrap();
        fs::write(
            dir.path().join(WORKLOG_DIR).join("config.toml"),
            "history_limit = 3\ntime_format = \"%H:%M\"\n",
        )
        .unwrap();

        let config = Config::for_project(dir.path()).unwrap();
        assert_eq!(config.project.history_limit, Some(3));
        assert_eq!(config.project.time_format, "%H:%M");
    }
}
