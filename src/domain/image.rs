//! Image configuration records
//!
//! Each image directory carries an `image.yml`:
//!
//! ```yaml
//! image_name: python
//! depends_on:
//!   - base
//! platforms:
//!   - linux/amd64
//!   - linux/arm64
//! ```
//!
//! [`ImageConfig`] is the parsed file as written. [`ArtifactRecord`] is the
//! resolved view the planner works with: defaults applied, dependencies typed.

use serde::{Deserialize, Serialize};

use super::id::ArtifactId;

/// Platform used when an image does not declare any
pub const DEFAULT_PLATFORM: &str = "linux/amd64";

/// Returns the built-in default platform list
pub fn default_platforms() -> Vec<String> {
    vec![DEFAULT_PLATFORM.to_string()]
}

/// Contents of an `image.yml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Declared image name; must match the directory name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    /// Images that must be built before this one
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Target platforms; absent means "use the default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
}

impl ImageConfig {
    /// Parses an `image.yml` document
    ///
    /// An empty document is treated as an empty configuration.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// An artifact with its configuration resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub id: ArtifactId,

    /// Dependencies as declared (may contain duplicates or unknown names)
    pub depends_on: Vec<ArtifactId>,

    /// Target platforms, never empty unless the config explicitly says so
    pub platforms: Vec<String>,

    /// `image_name` from the config, if any
    pub declared_name: Option<String>,

    /// Whether a usable `image.yml` was found for this artifact
    pub configured: bool,
}

impl ArtifactRecord {
    /// Record for an artifact without any configuration
    pub fn unconfigured(id: ArtifactId, default_platforms: &[String]) -> Self {
        Self {
            id,
            depends_on: Vec::new(),
            platforms: default_platforms.to_vec(),
            declared_name: None,
            configured: false,
        }
    }

    /// Record built from a parsed `image.yml`
    pub fn from_config(id: ArtifactId, config: ImageConfig, default_platforms: &[String]) -> Self {
        Self {
            id,
            depends_on: config.depends_on.into_iter().map(ArtifactId::from).collect(),
            platforms: config
                .platforms
                .unwrap_or_else(|| default_platforms.to_vec()),
            declared_name: config.image_name,
            configured: true,
        }
    }

    /// Convenience constructor for fixtures: configured, named after its id
    pub fn with_deps(id: &str, depends_on: &[&str]) -> Self {
        Self {
            id: ArtifactId::from(id),
            depends_on: depends_on.iter().map(|d| ArtifactId::from(*d)).collect(),
            platforms: default_platforms(),
            declared_name: Some(id.to_string()),
            configured: true,
        }
    }

    /// Platforms in the comma-joined form used by the build matrix
    pub fn platforms_joined(&self) -> String {
        self.platforms.join(",")
    }
}

/// State of an image's `image.yml` as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigState {
    /// No `image.yml` in the image directory
    Missing,
    /// The file exists but could not be read or parsed
    Invalid(String),
    /// The file parsed successfully
    Parsed(ImageConfig),
}

/// State of an optional file next to `image.yml`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompanionFile {
    #[default]
    Absent,
    /// The file exists but could not be read
    Unreadable(String),
    Present(String),
}

impl CompanionFile {
    /// Contents of a readable file
    pub fn content(&self) -> Option<&str> {
        match self {
            CompanionFile::Present(content) => Some(content),
            CompanionFile::Absent | CompanionFile::Unreadable(_) => None,
        }
    }
}

/// Everything known about one image directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: ArtifactId,
    pub config: ConfigState,

    /// Whether `pre-build.sh` exists
    pub has_pre_build: bool,

    /// `pre-build.requires`, which only matters alongside `pre-build.sh`
    pub pre_build_requires: CompanionFile,
}

impl ImageEntry {
    /// Entry for an image with a parsed config and no pre-build hook
    pub fn parsed(id: impl Into<ArtifactId>, config: ImageConfig) -> Self {
        Self {
            id: id.into(),
            config: ConfigState::Parsed(config),
            has_pre_build: false,
            pre_build_requires: CompanionFile::Absent,
        }
    }

    /// Resolves the entry into a record for graph construction
    ///
    /// Missing and invalid configs both resolve to an unconfigured record;
    /// callers decide whether an invalid config is fatal.
    pub fn to_record(&self, default_platforms: &[String]) -> ArtifactRecord {
        match &self.config {
            ConfigState::Parsed(config) => {
                ArtifactRecord::from_config(self.id.clone(), config.clone(), default_platforms)
            }
            ConfigState::Missing | ConfigState::Invalid(_) => {
                ArtifactRecord::unconfigured(self.id.clone(), default_platforms)
            }
        }
    }
}
