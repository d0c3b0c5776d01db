//! Build plan generation
//!
//! Combines impact analysis and layered scheduling into the matrix consumed
//! by CI:
//!
//! ```json
//! {"layers":[{"layer":0,"include":[{"name":"base","path":"images/base","platforms":"linux/amd64"}]}]}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::graph::{DanglingRef, DependencyGraph};
use super::id::ArtifactId;
use super::image::ArtifactRecord;
use super::impact::affected_by;
use super::schedule::{layered_order, CycleError};

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Images depend on non-existent images: {}", format_dangling(.0))]
    Dangling(Vec<DanglingRef>),

    #[error(transparent)]
    Cycle(#[from] CycleError),
}

fn format_dangling(refs: &[DanglingRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which images to plan for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every known image; skips impact analysis
    All,
    /// Images that changed; expanded to everything depending on them
    Changed(Vec<String>),
}

/// Knobs for plan generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Prefix for the `path` field of matrix entries
    pub path_prefix: String,

    /// Schedule even when some dependencies name unknown images,
    /// ignoring those edges
    pub allow_dangling: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            path_prefix: "images".to_string(),
            allow_dangling: false,
        }
    }
}

/// One image in the build matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub name: ArtifactId,
    pub path: String,
    /// Comma-joined platform list
    pub platforms: String,
}

/// A batch of images that can be built in parallel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLayer {
    pub layer: usize,
    pub include: Vec<MatrixEntry>,
}

/// The full, ordered build matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub layers: Vec<PlanLayer>,
}

impl BuildPlan {
    /// Total number of images across all layers
    pub fn image_count(&self) -> usize {
        self.layers.iter().map(|l| l.include.len()).sum()
    }

    /// Returns true if nothing needs building
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// A plan plus what was dropped on the way, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub plan: BuildPlan,

    /// Images selected for building (after impact analysis)
    pub targets: BTreeSet<ArtifactId>,

    /// Changed names that are not known images, sorted
    pub ignored: Vec<String>,

    /// Dangling edges left out of scheduling (only with `allow_dangling`)
    pub excluded: Vec<DanglingRef>,
}

/// Computes the layered build plan for a selection
///
/// `records` must be the records `graph` was built from. Fails when the
/// graph has dangling dependencies (unless allowed) or when the selected
/// images contain a cycle.
pub fn plan(
    records: &[ArtifactRecord],
    graph: &DependencyGraph,
    selection: &Selection,
    options: &PlanOptions,
) -> Result<PlanOutcome, PlanError> {
    let excluded = graph.dangling().to_vec();
    if !excluded.is_empty() && !options.allow_dangling {
        return Err(PlanError::Dangling(excluded));
    }

    let (targets, ignored): (BTreeSet<ArtifactId>, Vec<String>) = match selection {
        Selection::All => (graph.artifact_ids().cloned().collect(), Vec::new()),
        Selection::Changed(names) => {
            let (known, unknown): (Vec<ArtifactId>, Vec<ArtifactId>) = names
                .iter()
                .map(|name| ArtifactId::from(name.as_str()))
                .partition(|id| graph.contains(id));

            let mut ignored: Vec<String> = unknown.into_iter().map(|id| id.to_string()).collect();
            ignored.sort();
            ignored.dedup();

            (affected_by(graph, &known), ignored)
        }
    };

    let layers = layered_order(graph, &targets)?;

    let by_id: BTreeMap<&ArtifactId, &ArtifactRecord> =
        records.iter().map(|record| (&record.id, record)).collect();
    let prefix = options.path_prefix.trim_end_matches('/');

    let layers = layers
        .into_iter()
        .enumerate()
        .map(|(index, layer)| PlanLayer {
            layer: index,
            include: layer
                .into_iter()
                .map(|id| {
                    let platforms = by_id
                        .get(&id)
                        .map(|record| record.platforms_joined())
                        .unwrap_or_default();
                    let path = if prefix.is_empty() {
                        id.to_string()
                    } else {
                        format!("{}/{}", prefix, id)
                    };
                    MatrixEntry {
                        name: id,
                        path,
                        platforms,
                    }
                })
                .collect(),
        })
        .collect();

    Ok(PlanOutcome {
        plan: BuildPlan { layers },
        targets,
        ignored,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ArtifactRecord> {
        let mut python = ArtifactRecord::with_deps("python", &["base"]);
        python.platforms = vec!["linux/amd64".into(), "linux/arm64".into()];

        vec![
            ArtifactRecord::with_deps("base", &[]),
            python,
            ArtifactRecord::with_deps("node", &["base"]),
            ArtifactRecord::with_deps("web", &["node", "python"]),
            ArtifactRecord::with_deps("tools", &[]),
        ]
    }

    fn changed(names: &[&str]) -> Selection {
        Selection::Changed(names.iter().map(|n| n.to_string()).collect())
    }

    fn layer_names(plan: &BuildPlan) -> Vec<Vec<&str>> {
        plan.layers
            .iter()
            .map(|l| l.include.iter().map(|e| e.name.as_str()).collect())
            .collect()
    }

    #[test]
    fn all_selects_everything() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &Selection::All, &PlanOptions::default()).unwrap();

        assert_eq!(
            layer_names(&outcome.plan),
            vec![vec!["base", "tools"], vec!["node", "python"], vec!["web"]]
        );
        assert_eq!(outcome.plan.image_count(), 5);
        assert_eq!(outcome.targets.len(), 5);
        assert!(outcome.ignored.is_empty());
    }

    #[test]
    fn layer_indices_are_sequential() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &Selection::All, &PlanOptions::default()).unwrap();

        let indices: Vec<_> = outcome.plan.layers.iter().map(|l| l.layer).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn changed_expands_to_dependents() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &changed(&["python"]), &PlanOptions::default()).unwrap();

        assert_eq!(layer_names(&outcome.plan), vec![vec!["python"], vec!["web"]]);
    }

    #[test]
    fn unknown_changes_are_ignored() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(
            &records,
            &graph,
            &changed(&["ghost", "tools", "ghost", "README.md"]),
            &PlanOptions::default(),
        )
        .unwrap();

        assert_eq!(layer_names(&outcome.plan), vec![vec!["tools"]]);
        assert_eq!(outcome.ignored, vec!["README.md", "ghost"]);
    }

    #[test]
    fn no_changes_means_empty_plan() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &changed(&[]), &PlanOptions::default()).unwrap();

        assert!(outcome.plan.is_empty());
        assert_eq!(serde_json::to_string(&outcome.plan).unwrap(), r#"{"layers":[]}"#);
    }

    #[test]
    fn entries_carry_path_and_platforms() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &changed(&["python"]), &PlanOptions::default()).unwrap();

        assert_eq!(
            outcome.plan.layers[0].include[0],
            MatrixEntry {
                name: ArtifactId::from("python"),
                path: "images/python".to_string(),
                platforms: "linux/amd64,linux/arm64".to_string(),
            }
        );
    }

    #[test]
    fn custom_path_prefix() {
        let records = records();
        let graph = DependencyGraph::build(&records);
        let options = PlanOptions {
            path_prefix: "docker/images/".to_string(),
            ..PlanOptions::default()
        };
        let outcome = plan(&records, &graph, &changed(&["tools"]), &options).unwrap();
        assert_eq!(outcome.plan.layers[0].include[0].path, "docker/images/tools");
    }

    #[test]
    fn serialized_shape() {
        let records = vec![ArtifactRecord::with_deps("base", &[])];
        let graph = DependencyGraph::build(&records);
        let outcome = plan(&records, &graph, &Selection::All, &PlanOptions::default()).unwrap();

        assert_eq!(
            serde_json::to_string(&outcome.plan).unwrap(),
            r#"{"layers":[{"layer":0,"include":[{"name":"base","path":"images/base","platforms":"linux/amd64"}]}]}"#
        );
    }

    #[test]
    fn dangling_dependencies_fail_by_default() {
        let records = vec![
            ArtifactRecord::with_deps("P", &["Q"]),
            ArtifactRecord::with_deps("R", &[]),
        ];
        let graph = DependencyGraph::build(&records);
        let err = plan(&records, &graph, &Selection::All, &PlanOptions::default()).unwrap_err();

        assert_eq!(
            err,
            PlanError::Dangling(vec![DanglingRef {
                artifact: ArtifactId::from("P"),
                dependency: ArtifactId::from("Q"),
            }])
        );
        assert_eq!(err.to_string(), "Images depend on non-existent images: P -> Q");
    }

    #[test]
    fn dangling_dependencies_can_be_allowed() {
        let records = vec![
            ArtifactRecord::with_deps("P", &["Q"]),
            ArtifactRecord::with_deps("R", &["P"]),
        ];
        let graph = DependencyGraph::build(&records);
        let options = PlanOptions {
            allow_dangling: true,
            ..PlanOptions::default()
        };
        let outcome = plan(&records, &graph, &Selection::All, &options).unwrap();

        assert_eq!(layer_names(&outcome.plan), vec![vec!["P"], vec!["R"]]);
        assert_eq!(outcome.excluded.len(), 1);
    }

    #[test]
    fn cycles_fail() {
        let records = vec![
            ArtifactRecord::with_deps("X", &["Y"]),
            ArtifactRecord::with_deps("Y", &["X"]),
        ];
        let graph = DependencyGraph::build(&records);
        let err = plan(&records, &graph, &changed(&["X"]), &PlanOptions::default()).unwrap_err();

        match err {
            PlanError::Cycle(cycle) => {
                assert_eq!(cycle.unresolved, vec![ArtifactId::from("X"), ArtifactId::from("Y")])
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn plan_is_deterministic() {
        let records = records();
        let mut reversed = records.clone();
        reversed.reverse();

        let a = plan(&records, &DependencyGraph::build(&records), &Selection::All, &PlanOptions::default())
            .unwrap();
        let b = plan(&reversed, &DependencyGraph::build(&reversed), &Selection::All, &PlanOptions::default())
            .unwrap();

        assert_eq!(
            serde_json::to_string(&a.plan).unwrap(),
            serde_json::to_string(&b.plan).unwrap()
        );
    }
}
