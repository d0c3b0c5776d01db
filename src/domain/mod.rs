//! Domain models for layerplan
//!
//! Contains the graph algorithms and validation rules without any I/O
//! concerns. Everything here works on in-memory records supplied by the
//! storage layer.

mod id;
mod image;
mod graph;
mod impact;
mod schedule;
mod validate;
mod plan;

pub use id::{join_ids, ArtifactId};
pub use image::{default_platforms, ArtifactRecord, CompanionFile, ConfigState, ImageConfig, ImageEntry, DEFAULT_PLATFORM};
pub use graph::{Adjacency, DanglingRef, DependencyGraph, GraphError};
pub use impact::affected_by;
pub use schedule::{layered_order, CycleError, Layer};
pub use validate::{check_conventions, sort_violations, validate_catalog, StructuralValidator, Violation};
pub use plan::{plan, BuildPlan, MatrixEntry, PlanError, PlanLayer, PlanOptions, PlanOutcome, Selection};
