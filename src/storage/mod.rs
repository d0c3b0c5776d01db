//! # Storage Layer
//!
//! Reads image definitions and tool configuration from disk.
//!
//! ## Repository Layout
//!
//! ```text
//! repo/
//! ├── layerplan.toml            # Optional tool configuration
//! └── images/
//!     ├── base/
//!     │   └── image.yml         # image_name, depends_on, platforms
//!     └── python/
//!         ├── image.yml
//!         ├── pre-build.sh      # Optional hook
//!         └── pre-build.requires
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for a repository: root, config, catalog
//! - [`ArtifactCatalog`] - Source of image definitions
//! - [`ImagesDir`] / [`MemoryCatalog`] - On-disk and in-memory catalogs
//! - [`Config`] - Tool configuration (`layerplan.toml`)

mod catalog;
mod config;
mod project;

pub use catalog::{
    scan, ArtifactCatalog, CatalogError, ImagesDir, MemoryCatalog, CONFIG_FILE, PRE_BUILD_REQUIRES,
    PRE_BUILD_SCRIPT,
};
pub use config::{Config, ConfigError};
pub use project::{Project, ProjectError};
