//! Command handlers - kept out of main.rs so they can be tested
//!
//! Each handler renders its output to a `String`; `main` decides where it
//! goes.

pub mod check_config;
pub mod explain;
pub mod manual_mocks;

pub use check_config::execute_check_config;
pub use explain::{execute_explain, explain_modules, ModuleDecision};
pub use manual_mocks::execute_manual_mocks;

use crate::error::CliResult;
use bundlemock::{BundleStats, ProjectConfig};
use std::path::Path;
use tracing::info;

/// Load the project config and the bundle stats it points at
///
/// `stats` overrides the configured stats path.
pub fn load_project(
    config: &Path,
    stats: Option<&Path>,
) -> CliResult<(ProjectConfig, BundleStats)> {
    let project = ProjectConfig::load(config)?;
    let stats_path = stats.map_or_else(|| project.stats_path(), Path::to_path_buf);
    info!(config = %config.display(), stats = %stats_path.display(), "loading project");
    let stats = BundleStats::load(&stats_path)?;
    Ok((project, stats))
}
