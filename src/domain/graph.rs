//! Dependency graph for images
//!
//! Built once per invocation from the resolved artifact records and never
//! mutated afterwards. Uses petgraph for storage; edges point from a
//! dependency to its dependent, so "incoming" neighbours are what an image
//! depends on and "outgoing" neighbours are the images that depend on it.
//!
//! Only dependencies that name a known artifact become edges. Everything
//! else is kept in [`DependencyGraph::dangling`] so callers can report it.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use super::id::ArtifactId;
use super::image::ArtifactRecord;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(ArtifactId),
}

/// A declared dependency on an artifact that does not exist
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DanglingRef {
    /// The artifact that declares the dependency
    pub artifact: ArtifactId,

    /// The unknown name it depends on
    pub dependency: ArtifactId,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.artifact, self.dependency)
    }
}

/// Forward or reverse adjacency, keyed by every known artifact
pub type Adjacency<'a> = BTreeMap<&'a ArtifactId, BTreeSet<&'a ArtifactId>>;

/// The dependency graph between images
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph (dependency -> dependent)
    graph: DiGraph<ArtifactId, ()>,

    /// Map from artifact to node index
    node_map: BTreeMap<ArtifactId, NodeIndex>,

    /// Declared dependencies that resolve to no known artifact, sorted
    dangling: Vec<DanglingRef>,
}

impl DependencyGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from the full set of artifact records
    ///
    /// Every record becomes a node, even without dependencies. A dependency
    /// naming an unknown artifact adds no edge and is recorded as dangling.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a ArtifactRecord>) -> Self {
        let mut graph = Self::new();

        // First pass: add all nodes
        let records: Vec<_> = records.into_iter().collect();
        for record in &records {
            graph.add_artifact(record.id.clone());
        }

        // Second pass: add all edges
        let mut dangling = Vec::new();
        for record in &records {
            for dep in &record.depends_on {
                if let Err(GraphError::ArtifactNotFound(_)) = graph.add_dependency(&record.id, dep) {
                    dangling.push(DanglingRef {
                        artifact: record.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        dangling.sort();
        dangling.dedup();
        graph.dangling = dangling;
        graph
    }

    /// Adds an artifact to the graph
    pub fn add_artifact(&mut self, id: ArtifactId) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
        }
    }

    /// Adds a dependency edge: `artifact` depends on `depends_on`
    ///
    /// Both ends must already be in the graph. Adding the same edge twice
    /// is a no-op.
    pub fn add_dependency(
        &mut self,
        artifact: &ArtifactId,
        depends_on: &ArtifactId,
    ) -> Result<(), GraphError> {
        let artifact_idx = *self
            .node_map
            .get(artifact)
            .ok_or_else(|| GraphError::ArtifactNotFound(artifact.clone()))?;

        let dep_idx = *self
            .node_map
            .get(depends_on)
            .ok_or_else(|| GraphError::ArtifactNotFound(depends_on.clone()))?;

        self.graph.update_edge(dep_idx, artifact_idx, ());
        Ok(())
    }

    /// Returns the direct dependencies of an artifact
    pub fn dependencies(&self, id: &ArtifactId) -> BTreeSet<&ArtifactId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the direct dependents of an artifact (images built on top of it)
    pub fn dependents(&self, id: &ArtifactId) -> BTreeSet<&ArtifactId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &ArtifactId, direction: Direction) -> BTreeSet<&ArtifactId> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return BTreeSet::new(),
        };

        self.graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n))
            .collect()
    }

    /// Forward adjacency: artifact -> its dependencies
    pub fn forward(&self) -> Adjacency<'_> {
        self.node_map
            .keys()
            .map(|id| (id, self.dependencies(id)))
            .collect()
    }

    /// Reverse adjacency: artifact -> its dependents
    pub fn reverse(&self) -> Adjacency<'_> {
        self.node_map
            .keys()
            .map(|id| (id, self.dependents(id)))
            .collect()
    }

    /// Dependencies that could not be resolved, sorted
    pub fn dangling(&self) -> &[DanglingRef] {
        &self.dangling
    }

    /// Returns true if the graph contains the artifact
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the number of artifacts in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of resolved dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns all artifact IDs in sorted order
    pub fn artifact_ids(&self) -> impl Iterator<Item = &ArtifactId> {
        self.node_map.keys()
    }
}
