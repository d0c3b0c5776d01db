//! layerplan - Layered build matrix planner for container images

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = layerplan::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
