//! Layered scheduling
//!
//! Splits a set of images into layers using Kahn's algorithm. Every image in
//! a layer only depends on images from earlier layers, so a CI runner can
//! build each layer as one parallel batch.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::graph::DependencyGraph;
use super::id::{join_ids, ArtifactId};

/// One batch of images that can be built concurrently, sorted by name
pub type Layer = Vec<ArtifactId>;

/// No image in the remaining set can be scheduled
///
/// Lists every image that was still waiting, not only the ones forming the
/// loop: images blocked behind a cycle are unresolved too.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Circular dependency detected among images: {}", join_ids(.unresolved))]
pub struct CycleError {
    /// Remaining images, sorted
    pub unresolved: Vec<ArtifactId>,
}

/// Orders `targets` into dependency layers
///
/// Only dependencies inside `targets` count; anything outside the set is
/// assumed to be built already. Targets unknown to the graph have no
/// dependencies and land in the first layer.
pub fn layered_order<'a>(
    graph: &DependencyGraph,
    targets: impl IntoIterator<Item = &'a ArtifactId>,
) -> Result<Vec<Layer>, CycleError> {
    let remaining: BTreeSet<&ArtifactId> = targets.into_iter().collect();

    // In-degree restricted to the target subset
    let mut in_degree: BTreeMap<&ArtifactId, usize> = remaining
        .iter()
        .map(|id| {
            let count = graph
                .dependencies(id)
                .into_iter()
                .filter(|dep| remaining.contains(dep))
                .count();
            (*id, count)
        })
        .collect();

    let mut layers = Vec::new();

    while !in_degree.is_empty() {
        // BTreeMap iteration keeps each layer sorted
        let layer: Layer = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| (*id).clone())
            .collect();

        if layer.is_empty() {
            return Err(CycleError {
                unresolved: in_degree.into_keys().cloned().collect(),
            });
        }

        for id in &layer {
            in_degree.remove(id);
        }

        for id in &layer {
            for dependent in graph.dependents(id) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                }
            }
        }

        layers.push(layer);
    }

    Ok(layers)
}
