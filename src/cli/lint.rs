//! Lint command: static checks over every image definition

use anyhow::{bail, Result};

use super::output::Output;
use crate::domain::validate_catalog;
use crate::storage::Project;

/// Runs all checks and prints every violation
///
/// Fails (non-zero exit) when at least one violation was found.
pub fn run(output: &Output, project: &Project) -> Result<()> {
    let catalog = project.catalog();
    if !catalog.exists() {
        output.success(&format!(
            "Directory {} not found.",
            project.config().images_dir.display()
        ));
        return Ok(());
    }

    let entries = project.scan()?;
    output.verbose_ctx("lint", &format!("Checking {} images", entries.len()));

    let violations = validate_catalog(&entries, &project.config().default_platforms);
    let structural = violations.iter().filter(|v| v.is_structural()).count();
    output.verbose_ctx(
        "lint",
        &format!(
            "{} structural, {} convention violation(s)",
            structural,
            violations.len() - structural
        ),
    );

    if output.is_json() {
        let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
        output.data(&serde_json::json!({
            "violations": messages,
            "count": violations.len(),
        }))?;
    } else {
        for violation in &violations {
            println!("{}", violation);
        }
    }

    if !violations.is_empty() {
        bail!("{} violation(s) found", violations.len());
    }

    if !output.is_json() {
        output.success("All checks passed.");
    }

    Ok(())
}
