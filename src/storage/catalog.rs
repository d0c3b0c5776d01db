//! Image catalogs
//!
//! A catalog lists the known images and hands out the files inside each
//! image directory. [`ImagesDir`] reads a directory tree on disk;
//! [`MemoryCatalog`] serves the same data from memory for tests and tools
//! that generate catalogs on the fly.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{ArtifactId, CompanionFile, ConfigState, ImageConfig, ImageEntry};

/// Per-image configuration file
pub const CONFIG_FILE: &str = "image.yml";

/// Optional hook run before an image is built
pub const PRE_BUILD_SCRIPT: &str = "pre-build.sh";

/// Companion to the pre-build hook listing what it needs
pub const PRE_BUILD_REQUIRES: &str = "pre-build.requires";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to list images in {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of image definitions
pub trait ArtifactCatalog {
    /// All known image identifiers, sorted
    fn artifact_ids(&self) -> Result<Vec<ArtifactId>, CatalogError>;

    /// Returns true if the image directory contains `name`
    fn has_file(&self, id: &ArtifactId, name: &str) -> bool;

    /// Reads `name` from the image directory; `None` if it does not exist
    fn read_file(&self, id: &ArtifactId, name: &str) -> Result<Option<String>, CatalogError>;
}

/// Catalog backed by an `images/` directory: one subdirectory per image
pub struct ImagesDir {
    root: PathBuf,
}

impl ImagesDir {
    /// Creates a catalog rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the catalog root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if the root directory exists
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    fn file_path(&self, id: &ArtifactId, name: &str) -> PathBuf {
        self.root.join(id.as_str()).join(name)
    }
}

impl ArtifactCatalog for ImagesDir {
    fn artifact_ids(&self) -> Result<Vec<ArtifactId>, CatalogError> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|source| CatalogError::List {
            path: self.root.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::List {
                path: self.root.clone(),
                source,
            })?;

            if !entry.path().is_dir() {
                continue;
            }

            // Directory names that are not valid UTF-8 cannot be image names
            if let Ok(name) = entry.file_name().into_string() {
                ids.push(ArtifactId::from(name));
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn has_file(&self, id: &ArtifactId, name: &str) -> bool {
        self.file_path(id, name).is_file()
    }

    fn read_file(&self, id: &ArtifactId, name: &str) -> Result<Option<String>, CatalogError> {
        let path = self.file_path(id, name);
        if !path.is_file() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| CatalogError::Read { path, source })
    }
}

/// In-memory catalog: image -> file name -> contents
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    images: BTreeMap<ArtifactId, BTreeMap<String, String>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty image directory
    pub fn with_image(mut self, id: &str) -> Self {
        self.images.entry(ArtifactId::from(id)).or_default();
        self
    }

    /// Adds a file to an image directory, creating the image if needed
    pub fn with_file(mut self, id: &str, name: &str, content: &str) -> Self {
        self.images
            .entry(ArtifactId::from(id))
            .or_default()
            .insert(name.to_string(), content.to_string());
        self
    }

    /// Adds an image with an `image.yml` built from the given fields
    pub fn with_config(self, id: &str, depends_on: &[&str]) -> Self {
        let mut yaml = format!("image_name: {}\n", id);
        if !depends_on.is_empty() {
            yaml.push_str("depends_on:\n");
            for dep in depends_on {
                yaml.push_str(&format!("  - {}\n", dep));
            }
        }
        self.with_file(id, CONFIG_FILE, &yaml)
    }
}

impl ArtifactCatalog for MemoryCatalog {
    fn artifact_ids(&self) -> Result<Vec<ArtifactId>, CatalogError> {
        Ok(self.images.keys().cloned().collect())
    }

    fn has_file(&self, id: &ArtifactId, name: &str) -> bool {
        self.images
            .get(id)
            .is_some_and(|files| files.contains_key(name))
    }

    fn read_file(&self, id: &ArtifactId, name: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.images.get(id).and_then(|files| files.get(name)).cloned())
    }
}

/// Reads every image in the catalog into an [`ImageEntry`]
///
/// Unreadable or malformed files inside an image directory do not abort the
/// scan; they are recorded on the entry ([`ConfigState::Invalid`],
/// [`CompanionFile::Unreadable`]) so every problem can be reported at once.
/// Only failing to list the catalog itself is an error.
pub fn scan(catalog: &dyn ArtifactCatalog) -> Result<Vec<ImageEntry>, CatalogError> {
    let mut entries = Vec::new();

    for id in catalog.artifact_ids()? {
        let config = match catalog.read_file(&id, CONFIG_FILE) {
            Ok(None) => ConfigState::Missing,
            Ok(Some(content)) => match ImageConfig::from_yaml(&content) {
                Ok(config) => ConfigState::Parsed(config),
                Err(e) => ConfigState::Invalid(e.to_string()),
            },
            Err(e) => ConfigState::Invalid(e.to_string()),
        };

        let has_pre_build = catalog.has_file(&id, PRE_BUILD_SCRIPT);
        let pre_build_requires = match catalog.read_file(&id, PRE_BUILD_REQUIRES) {
            Ok(None) => CompanionFile::Absent,
            Ok(Some(content)) => CompanionFile::Present(content),
            Err(e) => CompanionFile::Unreadable(e.to_string()),
        };

        entries.push(ImageEntry {
            id,
            config,
            has_pre_build,
            pre_build_requires,
        });
    }

    Ok(entries)
}
