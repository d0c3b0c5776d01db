//! Static validation of the image catalog
//!
//! Two families of checks:
//! - structural: dependencies on images that do not exist, and cycles
//!   anywhere in the catalog ([`StructuralValidator`])
//! - conventions: per-image file rules such as a parseable `image.yml`
//!   whose `image_name` matches its directory ([`check_conventions`])
//!
//! Every check runs to completion; [`validate_catalog`] returns the full,
//! sorted list of violations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use super::graph::DependencyGraph;
use super::id::{join_ids, ArtifactId};
use super::image::{ArtifactRecord, CompanionFile, ConfigState, ImageEntry};

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// No `image.yml` in the image directory
    MissingConfig { artifact: ArtifactId },

    /// `image.yml` could not be read or parsed
    InvalidConfig { artifact: ArtifactId, reason: String },

    /// `image.yml` has no `image_name`
    MissingImageName { artifact: ArtifactId },

    /// `image_name` differs from the directory name
    ImageNameMismatch { artifact: ArtifactId, declared: String },

    /// `platforms` is declared but empty
    EmptyPlatforms { artifact: ArtifactId },

    /// `pre-build.sh` without `pre-build.requires`
    MissingPreBuildRequires { artifact: ArtifactId },

    /// `pre-build.requires` exists but is blank
    EmptyPreBuildRequires { artifact: ArtifactId },

    /// `pre-build.requires` exists but could not be read
    UnreadablePreBuildRequires { artifact: ArtifactId, reason: String },

    /// Declared dependency on an image that does not exist
    DanglingDependency { artifact: ArtifactId, dependency: ArtifactId },

    /// Images that cannot be ordered (sorted)
    CircularDependency { artifacts: Vec<ArtifactId> },
}

impl Violation {
    /// The artifact a violation is reported against
    ///
    /// For cycles this is the first member in sorted order.
    pub fn subject(&self) -> Option<&ArtifactId> {
        match self {
            Violation::MissingConfig { artifact }
            | Violation::InvalidConfig { artifact, .. }
            | Violation::MissingImageName { artifact }
            | Violation::ImageNameMismatch { artifact, .. }
            | Violation::EmptyPlatforms { artifact }
            | Violation::MissingPreBuildRequires { artifact }
            | Violation::EmptyPreBuildRequires { artifact }
            | Violation::UnreadablePreBuildRequires { artifact, .. }
            | Violation::DanglingDependency { artifact, .. } => Some(artifact),
            Violation::CircularDependency { artifacts } => artifacts.first(),
        }
    }

    /// Returns true for dangling references and cycles
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Violation::DanglingDependency { .. } | Violation::CircularDependency { .. }
        )
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.subject()
            .cmp(&other.subject())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[RULE VIOLATION] ")?;
        match self {
            Violation::MissingConfig { artifact } => {
                write!(f, "{}: 'image.yml' is missing.", artifact)
            }
            Violation::InvalidConfig { artifact, reason } => {
                write!(f, "{}: 'image.yml' is invalid: {}", artifact, reason)
            }
            Violation::MissingImageName { artifact } => {
                write!(f, "{}: 'image_name' is not set in 'image.yml'.", artifact)
            }
            Violation::ImageNameMismatch { artifact, declared } => write!(
                f,
                "{}: 'image_name' is '{}' but the directory is '{}'.",
                artifact, declared, artifact
            ),
            Violation::EmptyPlatforms { artifact } => {
                write!(f, "{}: 'platforms' is declared but empty.", artifact)
            }
            Violation::MissingPreBuildRequires { artifact } => write!(
                f,
                "{}: 'pre-build.sh' exists but 'pre-build.requires' is missing.",
                artifact
            ),
            Violation::EmptyPreBuildRequires { artifact } => {
                write!(f, "{}: 'pre-build.requires' is empty.", artifact)
            }
            Violation::UnreadablePreBuildRequires { artifact, reason } => write!(
                f,
                "{}: 'pre-build.requires' could not be read: {}",
                artifact, reason
            ),
            Violation::DanglingDependency { artifact, dependency } => write!(
                f,
                "{}: depends on non-existent image '{}'.",
                artifact, dependency
            ),
            Violation::CircularDependency { artifacts } => write!(
                f,
                "circular dependency among images: {}.",
                join_ids(artifacts)
            ),
        }
    }
}

/// Sorts violations by artifact, then by message
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(Violation::sort_cmp);
}

/// Checks the whole dependency graph for dangling references and cycles
pub struct StructuralValidator<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> StructuralValidator<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    /// Runs every structural check
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .graph
            .dangling()
            .iter()
            .map(|d| Violation::DanglingDependency {
                artifact: d.artifact.clone(),
                dependency: d.dependency.clone(),
            })
            .collect();

        let cyclic = self.unordered_artifacts();
        if !cyclic.is_empty() {
            violations.push(Violation::CircularDependency { artifacts: cyclic });
        }

        violations
    }

    /// Artifacts left with a positive in-degree after a Kahn pass over the
    /// whole graph, sorted. Empty when the graph is acyclic.
    pub fn unordered_artifacts(&self) -> Vec<ArtifactId> {
        let mut in_degree: BTreeMap<&ArtifactId, usize> = self
            .graph
            .artifact_ids()
            .map(|id| (id, self.graph.dependencies(id).len()))
            .collect();

        let mut queue: VecDeque<&ArtifactId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut ordered = 0;
        while let Some(current) = queue.pop_front() {
            ordered += 1;
            for dependent in self.graph.dependents(current) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if ordered == self.graph.len() {
            return Vec::new();
        }

        in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Per-image file convention checks
pub fn check_conventions(entry: &ImageEntry) -> Vec<Violation> {
    let artifact = &entry.id;
    let mut violations = Vec::new();

    match &entry.config {
        ConfigState::Missing => violations.push(Violation::MissingConfig {
            artifact: artifact.clone(),
        }),
        ConfigState::Invalid(reason) => violations.push(Violation::InvalidConfig {
            artifact: artifact.clone(),
            reason: reason.clone(),
        }),
        ConfigState::Parsed(config) => {
            match config.image_name.as_deref() {
                None => violations.push(Violation::MissingImageName {
                    artifact: artifact.clone(),
                }),
                Some(name) if name != artifact.as_str() => {
                    violations.push(Violation::ImageNameMismatch {
                        artifact: artifact.clone(),
                        declared: name.to_string(),
                    })
                }
                Some(_) => {}
            }

            if config.platforms.as_ref().is_some_and(|p| p.is_empty()) {
                violations.push(Violation::EmptyPlatforms {
                    artifact: artifact.clone(),
                });
            }
        }
    }

    if entry.has_pre_build {
        match &entry.pre_build_requires {
            CompanionFile::Absent => violations.push(Violation::MissingPreBuildRequires {
                artifact: artifact.clone(),
            }),
            CompanionFile::Unreadable(reason) => {
                violations.push(Violation::UnreadablePreBuildRequires {
                    artifact: artifact.clone(),
                    reason: reason.clone(),
                })
            }
            CompanionFile::Present(content) if content.trim().is_empty() => {
                violations.push(Violation::EmptyPreBuildRequires {
                    artifact: artifact.clone(),
                })
            }
            CompanionFile::Present(_) => {}
        }
    }

    violations
}

/// Runs convention and structural checks over a scanned catalog
pub fn validate_catalog(entries: &[ImageEntry], default_platforms: &[String]) -> Vec<Violation> {
    let mut violations: Vec<Violation> = entries.iter().flat_map(check_conventions).collect();

    let records: Vec<ArtifactRecord> = entries
        .iter()
        .map(|entry| entry.to_record(default_platforms))
        .collect();
    let graph = DependencyGraph::build(&records);
    violations.extend(StructuralValidator::new(&graph).validate());

    sort_violations(&mut violations);
    violations
}
