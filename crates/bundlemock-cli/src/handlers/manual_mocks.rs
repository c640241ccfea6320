//! Manual-mocks command handler

use super::load_project;
use crate::commands::{ManualMocksArgs, OutputFormatArg};
use crate::error::{CliError, CliResult};
use bundlemock::{find_manual_mocks, ManualMockLink, ManualMockProbe};
use std::fmt::Write as _;

/// Execute the manual-mocks command
pub fn execute_manual_mocks(args: &ManualMocksArgs) -> CliResult<String> {
    let (project, stats) = load_project(&args.config, args.stats.as_deref())?;
    let root = args.root.clone().unwrap_or_else(|| project.root.clone());
    if !root.is_dir() {
        return Err(CliError::invalid_argument(format!(
            "root {} is not a directory",
            root.display()
        )));
    }

    let probe = ManualMockProbe::from_config(root, &project.bundle);
    let links = find_manual_mocks(&stats, &probe);
    match args.format {
        OutputFormatArg::Text => Ok(render_text(&links)),
        OutputFormatArg::Json => Ok(serde_json::to_string_pretty(&links)?),
    }
}

fn render_text(links: &[ManualMockLink]) -> String {
    if links.is_empty() {
        return "no manual mocks found".to_string();
    }
    let mut out = String::new();
    for link in links {
        let _ = writeln!(
            out,
            "{} -> {}  ({})",
            link.id,
            link.mock_id,
            link.mock_path.display()
        );
    }
    let _ = write!(out, "{} manual mocks", links.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlemock::ModuleId;
    use std::path::PathBuf;

    #[test]
    fn test_render_links() {
        let links = vec![ManualMockLink {
            id: ModuleId(3),
            mock_id: ModuleId(7),
            mock_path: PathBuf::from("/app/src/__mocks__/baz.js"),
        }];
        let text = render_text(&links);
        assert!(text.starts_with("3 -> 7  (/app/src/__mocks__/baz.js)"));
        assert!(text.ends_with("1 manual mocks"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_text(&[]), "no manual mocks found");
    }
}
