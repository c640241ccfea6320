//! Check-config command handler

use crate::commands::CheckConfigArgs;
use crate::error::CliResult;
use bundlemock::ProjectConfig;
use std::fmt::Write as _;

/// Execute the check-config command
///
/// Loads the config and compiles the unmock patterns; any problem is an error.
pub fn execute_check_config(args: &CheckConfigArgs) -> CliResult<String> {
    let project = ProjectConfig::load(&args.config)?;
    let matcher = project.mock.unmock_matcher()?;
    Ok(render_summary(&project, matcher.patterns()))
}

fn render_summary<'a>(project: &ProjectConfig, patterns: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::from("Configuration OK\n");
    let _ = writeln!(out, "  Automock: {}", project.mock.automock);
    let _ = writeln!(out, "  Entry module: {}", project.mock.entry_module_id);
    for pattern in patterns {
        let _ = writeln!(out, "  Unmock pattern: {pattern}");
    }
    let _ = writeln!(out, "  Stats: {}", project.stats_path().display());
    let _ = write!(
        out,
        "  Modules directories: {}",
        project.bundle.modules_directories.join(", ")
    );
    out
}
