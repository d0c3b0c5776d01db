//! Configuration handling for layerplan
//!
//! Configuration is read from an optional `layerplan.toml` at the repository
//! root. Every field has a default, so a repository with a plain `images/`
//! directory needs no configuration at all.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{default_platforms, PlanOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Repository-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per image, relative to the root
    pub images_dir: PathBuf,

    /// Prefix for the `path` field in the build matrix
    pub path_prefix: String,

    /// Platforms for images that do not declare any
    pub default_platforms: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("images"),
            path_prefix: "images".to_string(),
            default_platforms: default_platforms(),
        }
    }
}

impl Config {
    /// Name of the configuration file at the repository root
    pub const FILE_NAME: &'static str = "layerplan.toml";

    /// Loads configuration for a repository root
    ///
    /// A missing file yields the defaults.
    pub fn for_root(root: &Path) -> Result<Self> {
        let config_path = root.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Parses and validates configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.images_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("images_dir must not be empty".to_string()));
        }

        if self.default_platforms.is_empty() {
            return Err(ConfigError::Invalid(
                "default_platforms must list at least one platform".to_string(),
            ));
        }

        if self.default_platforms.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "default_platforms must not contain empty entries".to_string(),
            ));
        }

        Ok(())
    }

    /// Finds the repository root by looking for `layerplan.toml`, starting
    /// at `start` and walking up
    pub fn find_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(Self::FILE_NAME).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Finds the repository root from the current directory
    pub fn find_root() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::find_root_from(&cwd)
    }

    /// Plan options derived from this configuration
    pub fn plan_options(&self, allow_dangling: bool) -> PlanOptions {
        PlanOptions {
            path_prefix: self.path_prefix.clone(),
            allow_dangling,
        }
    }
}
