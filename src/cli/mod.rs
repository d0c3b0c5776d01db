//! # Command-Line Interface
//!
//! Commands consumed by CI pipelines and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `plan --changes '["base"]'` | Layered build matrix for changed images and their dependents |
//! | `plan --all` | Layered build matrix for every image |
//! | `lint` | Dangling dependencies, cycles and per-image file conventions |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `json` - Machine-parseable JSON (default for `plan`)
//! - `text` - Human-readable output (default for `lint`)
//!
//! ## Exit Codes
//!
//! `0` on success. `1` on malformed input, invalid image configuration,
//! dependency cycles, dangling dependencies, or any lint violation. The
//! diagnostic goes to stderr.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod plan;
mod lint;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
pub use plan::{parse_changes, InputError};
