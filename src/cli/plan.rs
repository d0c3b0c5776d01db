//! Plan command: layered build matrix for CI

use anyhow::{bail, Result};
use thiserror::Error;

use super::output::Output;
use crate::domain::{self, join_ids, BuildPlan, ConfigState, DependencyGraph, Selection};
use crate::storage::Project;

/// Malformed command-line input
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Invalid JSON for --changes: {0}")]
    InvalidJson(String),

    #[error("--changes must be a JSON list of image names")]
    NotAList,
}

/// Parses the `--changes` payload into image names
pub fn parse_changes(raw: &str) -> Result<Vec<String>, InputError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| InputError::InvalidJson(e.to_string()))?;

    let items = value.as_array().ok_or(InputError::NotAList)?;

    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or(InputError::NotAList))
        .collect()
}

/// Computes and prints the build plan
pub fn run(
    output: &Output,
    project: &Project,
    changes: &str,
    all: bool,
    allow_dangling: bool,
) -> Result<()> {
    // Input is validated before the catalog is read
    let selection = if all {
        if changes.trim() != "[]" {
            output.verbose_ctx("plan", "--all given, ignoring --changes");
        }
        Selection::All
    } else {
        Selection::Changed(parse_changes(changes)?)
    };

    let entries = project.scan()?;
    output.verbose_ctx("plan", &format!("Found {} images", entries.len()));

    let invalid: Vec<String> = entries
        .iter()
        .filter_map(|entry| match &entry.config {
            ConfigState::Invalid(reason) => Some(format!("{}: {}", entry.id, reason)),
            _ => None,
        })
        .collect();
    if !invalid.is_empty() {
        bail!(
            "{} image(s) have an invalid image.yml:\n  {}",
            invalid.len(),
            invalid.join("\n  ")
        );
    }

    let records = project.records(&entries);
    let graph = DependencyGraph::build(&records);
    output.verbose_ctx(
        "plan",
        &format!("Dependency graph: {} images, {} edges", graph.len(), graph.edge_count()),
    );

    let options = project.config().plan_options(allow_dangling);
    let outcome = domain::plan(&records, &graph, &selection, &options)?;

    if output.is_verbose() {
        for name in &outcome.ignored {
            output.verbose_ctx("plan", &format!("Ignoring unknown image: {}", name));
        }
        for dangling in &outcome.excluded {
            output.verbose_ctx("plan", &format!("Excluding dangling dependency: {}", dangling));
        }
        output.verbose_ctx(
            "plan",
            &format!(
                "Targets ({}): {}",
                outcome.targets.len(),
                join_ids(&outcome.targets)
            ),
        );
    }

    if output.is_json() {
        output.data(&outcome.plan)?;
    } else {
        print_text(&outcome.plan);
    }

    Ok(())
}

fn print_text(plan: &BuildPlan) {
    if plan.is_empty() {
        println!("Nothing to build.");
        return;
    }

    println!(
        "Build plan: {} image(s) in {} layer(s)",
        plan.image_count(),
        plan.layers.len()
    );
    for layer in &plan.layers {
        println!();
        println!("Layer {}:", layer.layer);
        println!("  {:<24} {:<32} PLATFORMS", "NAME", "PATH");
        for entry in &layer.include {
            println!("  {:<24} {:<32} {}", entry.name.as_str(), entry.path, entry.platforms);
        }
    }
}
