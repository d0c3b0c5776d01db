//! Impact analysis
//!
//! When an image changes, every image built on top of it (directly or
//! through a chain of dependencies) has to be rebuilt too.

use std::collections::{BTreeSet, VecDeque};

use super::graph::DependencyGraph;
use super::id::ArtifactId;

/// Expands `changed` to every artifact that transitively depends on it
///
/// Breadth-first walk over the reverse adjacency; each artifact is visited
/// once. The result always contains `changed` itself.
pub fn affected_by<'a>(
    graph: &DependencyGraph,
    changed: impl IntoIterator<Item = &'a ArtifactId>,
) -> BTreeSet<ArtifactId> {
    let mut affected: BTreeSet<ArtifactId> = BTreeSet::new();
    let mut queue = VecDeque::new();

    for id in changed {
        if affected.insert(id.clone()) {
            queue.push_back(id.clone());
        }
    }

    while let Some(current) = queue.pop_front() {
        for dependent in graph.dependents(&current) {
            if !affected.contains(dependent) {
                affected.insert(dependent.clone());
                queue.push_back(dependent.clone());
            }
        }
    }

    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactRecord;

    fn ids(names: &[&str]) -> Vec<ArtifactId> {
        names.iter().map(|n| ArtifactId::from(*n)).collect()
    }

    fn names(set: &BTreeSet<ArtifactId>) -> Vec<&str> {
        set.iter().map(ArtifactId::as_str).collect()
    }

    fn chain() -> DependencyGraph {
        DependencyGraph::build(&[
            ArtifactRecord::with_deps("A", &[]),
            ArtifactRecord::with_deps("B", &["A"]),
            ArtifactRecord::with_deps("C", &["B"]),
        ])
    }

    #[test]
    fn empty_seed_is_empty() {
        let graph = chain();
        assert!(affected_by(&graph, &ids(&[])).is_empty());
    }

    #[test]
    fn transitive_chain() {
        let graph = chain();
        let affected = affected_by(&graph, &ids(&["A"]));
        assert_eq!(names(&affected), vec!["A", "B", "C"]);
    }

    #[test]
    fn leaf_change_affects_only_itself() {
        let graph = chain();
        let affected = affected_by(&graph, &ids(&["C"]));
        assert_eq!(names(&affected), vec!["C"]);
    }

    #[test]
    fn no_edges_is_identity() {
        let graph = DependencyGraph::build(&[
            ArtifactRecord::with_deps("x", &[]),
            ArtifactRecord::with_deps("y", &[]),
            ArtifactRecord::with_deps("z", &[]),
        ]);
        let affected = affected_by(&graph, &ids(&["x", "z"]));
        assert_eq!(names(&affected), vec!["x", "z"]);
    }

    #[test]
    fn diamond_visits_each_once() {
        let graph = DependencyGraph::build(&[
            ArtifactRecord::with_deps("base", &[]),
            ArtifactRecord::with_deps("left", &["base"]),
            ArtifactRecord::with_deps("right", &["base"]),
            ArtifactRecord::with_deps("top", &["left", "right"]),
            ArtifactRecord::with_deps("unrelated", &[]),
        ]);
        let affected = affected_by(&graph, &ids(&["base"]));
        assert_eq!(names(&affected), vec!["base", "left", "right", "top"]);
    }

    #[test]
    fn cycles_terminate() {
        let graph = DependencyGraph::build(&[
            ArtifactRecord::with_deps("x", &["y"]),
            ArtifactRecord::with_deps("y", &["x"]),
            ArtifactRecord::with_deps("z", &["y"]),
        ]);
        let affected = affected_by(&graph, &ids(&["x"]));
        assert_eq!(names(&affected), vec!["x", "y", "z"]);
    }

    #[test]
    fn duplicate_seeds_are_harmless() {
        let graph = chain();
        let affected = affected_by(&graph, &ids(&["B", "B"]));
        assert_eq!(names(&affected), vec!["B", "C"]);
    }

    #[test]
    fn seed_order_does_not_matter() {
        let graph = chain();
        assert_eq!(
            affected_by(&graph, &ids(&["C", "A"])),
            affected_by(&graph, &ids(&["A", "C"]))
        );
    }
}
