//! Repository access
//!
//! Ties together the repository root, its configuration and the image
//! catalog that lives under it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::catalog::{scan, ImagesDir};
use super::Config;
use crate::domain::{ArtifactRecord, ImageEntry};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Repository root does not exist: {0}")]
    RootNotFound(PathBuf),
}

/// A repository containing image definitions
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens the repository at the given root
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(ProjectError::RootNotFound(root).into());
        }

        let config = Config::for_root(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the repository containing the current directory
    ///
    /// Uses the nearest ancestor with a `layerplan.toml`, or the current
    /// directory itself when there is none.
    pub fn open_current() -> Result<Self> {
        let root = match Config::find_root() {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        Self::open(root)
    }

    /// Returns the repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the images directory
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(&self.config.images_dir)
    }

    /// Returns the image catalog for this repository
    pub fn catalog(&self) -> ImagesDir {
        ImagesDir::new(self.images_dir())
    }

    /// Reads every image definition in the repository
    pub fn scan(&self) -> Result<Vec<ImageEntry>> {
        let catalog = self.catalog();
        scan(&catalog).with_context(|| {
            format!("Failed to scan images in {}", catalog.root().display())
        })
    }

    /// Resolves scanned entries into records using the configured defaults
    pub fn records(&self, entries: &[ImageEntry]) -> Vec<ArtifactRecord> {
        entries
            .iter()
            .map(|entry| entry.to_record(&self.config.default_platforms))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn open_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let result = Project::open(dir.path().join("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn images_dir_follows_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(Config::FILE_NAME), "images_dir = \"containers\"\n").unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.images_dir(), dir.path().join("containers"));
        assert_eq!(project.catalog().root(), dir.path().join("containers"));
    }

    #[test]
    fn records_use_configured_default_platforms() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(Config::FILE_NAME),
            "default_platforms = [\"linux/arm64\"]\n",
        )
        .unwrap();
        let base = dir.path().join("images").join("base");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("image.yml"), "image_name: base\n").unwrap();

        let project = Project::open(dir.path()).unwrap();
        let entries = project.scan().unwrap();
        let records = project.records(&entries);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platforms_joined(), "linux/arm64");
    }
}
