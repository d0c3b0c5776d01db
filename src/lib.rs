//! layerplan - Dependency-aware build planning for container image repositories
//!
//! Every image lives in its own directory with an `image.yml` declaring the
//! images it depends on. layerplan turns those declarations into a graph,
//! expands a set of changed images to everything that must be rebuilt, and
//! splits the result into layers that can each be built in parallel.
//! A companion linter checks the same graph for dangling references and
//! cycles, plus per-image file conventions.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{ArtifactId, ArtifactRecord, BuildPlan, DependencyGraph, ImageConfig, Violation};
