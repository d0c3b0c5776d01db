//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{lint, plan};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "layerplan")]
#[command(author, version, about = "Dependency-aware build matrix planner for container images")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository root (defaults to the nearest directory with layerplan.toml,
    /// then the current directory)
    #[arg(long, global = true, env = "LAYERPLAN_ROOT")]
    pub root: Option<PathBuf>,

    /// Output format (plan defaults to json, lint to text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the layered build matrix for changed (or all) images
    Plan {
        /// JSON list of changed image names, e.g. '["base","python"]'
        #[arg(long, default_value = "[]")]
        changes: String,

        /// Build every image (takes precedence over --changes)
        #[arg(long)]
        all: bool,

        /// Ignore dependencies on images that do not exist instead of failing
        #[arg(long)]
        allow_dangling: bool,
    },

    /// Check image definitions for dependency and file convention problems
    Lint,
}

impl Commands {
    fn default_format(&self) -> OutputFormat {
        match self {
            Commands::Plan { .. } => OutputFormat::Json,
            Commands::Lint => OutputFormat::Text,
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_else(|| cli.command.default_format());
    let output = Output::new(format, cli.verbose);

    output.verbose("layerplan starting");

    let project = match &cli.root {
        Some(root) => Project::open(root.clone())?,
        None => Project::open_current()?,
    };
    output.verbose(&format!(
        "Repository root: {}, images: {}",
        project.root().display(),
        project.images_dir().display()
    ));

    match cli.command {
        Commands::Plan {
            changes,
            all,
            allow_dangling,
        } => {
            output.verbose_ctx(
                "plan",
                &format!("all={}, changes={}, allow_dangling={}", all, changes, allow_dangling),
            );
            plan::run(&output, &project, &changes, all, allow_dangling)?
        }

        Commands::Lint => lint::run(&output, &project)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
