//! Explain command handler

use super::load_project;
use crate::commands::{ExplainArgs, OutputFormatArg};
use crate::error::CliResult;
use bundlemock::{BundleStats, MockDecision, ModuleId, ModuleRegistry, ProjectConfig};
use console::style;
use serde::Serialize;
use std::fmt::Write as _;
use std::rc::Rc;

/// Default mock decision for one module
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDecision {
    /// Module id
    pub id: ModuleId,
    /// Resolved identifier
    pub identifier: String,
    /// Decision in words
    pub decision: String,
    /// Whether the module is mocked by default
    pub mock: bool,
    /// Unmock pattern that exempted the module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmock_pattern: Option<String>,
}

/// Execute the explain command
pub fn execute_explain(args: &ExplainArgs) -> CliResult<String> {
    let (project, stats) = load_project(&args.config, args.stats.as_deref())?;
    let decisions = explain_modules(&project, &stats)?;
    match args.format {
        OutputFormatArg::Text => Ok(render_text(&decisions)),
        OutputFormatArg::Json => Ok(serde_json::to_string_pretty(&decisions)?),
    }
}

/// Mock decision for every module in the stats, before any test declarations
pub fn explain_modules(
    project: &ProjectConfig,
    stats: &BundleStats,
) -> CliResult<Vec<ModuleDecision>> {
    let config = Rc::new(project.mock.clone());
    let matcher = config.unmock_matcher()?;
    let registry = ModuleRegistry::new(Rc::new(stats.clone()), config)?;

    stats
        .ids()
        .into_iter()
        .map(|id| {
            let decision = registry.decide(id)?;
            let identifier = stats.identifier(id).unwrap_or_default().to_string();
            let unmock_pattern = (decision == MockDecision::UnmockPattern)
                .then(|| matcher.first_match(&identifier).map(str::to_string))
                .flatten();
            Ok(ModuleDecision {
                id,
                identifier,
                decision: decision.describe().to_string(),
                mock: decision.is_mock(),
                unmock_pattern,
            })
        })
        .collect()
}

fn render_text(decisions: &[ModuleDecision]) -> String {
    let mut out = String::new();
    let mocked = decisions.iter().filter(|d| d.mock).count();
    for decision in decisions {
        let label = if decision.mock {
            style(decision.decision.as_str()).yellow()
        } else {
            style(decision.decision.as_str()).green()
        };
        let _ = write!(out, "{:>5}  {label}  {}", decision.id.get(), decision.identifier);
        if let Some(pattern) = &decision.unmock_pattern {
            let _ = write!(out, "  {}", style(format!("[{pattern}]")).dim());
        }
        out.push('\n');
    }
    let _ = write!(
        out,
        "{} modules, {mocked} mocked by default",
        decisions.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlemock::{MockConfig, StatsModule};

    fn stats() -> BundleStats {
        let module = |id: u32, identifier: &str| StatsModule {
            id: ModuleId(id),
            identifier: identifier.to_string(),
            name: None,
        };
        BundleStats::from_modules(vec![
            module(0, "/app/src/__tests__/foo.js"),
            module(1, "/app/src/foo.js"),
            module(2, "/app/node_modules/react/react.js"),
        ])
    }

    fn project(mock: MockConfig) -> ProjectConfig {
        ProjectConfig {
            mock,
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn test_explain_decisions() {
        let project = project(MockConfig::new().with_unmock_pattern("/node_modules/"));
        let decisions = explain_modules(&project, &stats()).unwrap();

        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0].decision, "real (entry)");
        assert!(decisions[1].mock);
        assert_eq!(decisions[2].decision, "real (unmock pattern)");
        assert_eq!(decisions[2].unmock_pattern.as_deref(), Some("/node_modules/"));
    }

    #[test]
    fn test_explain_automock_off() {
        let project = project(MockConfig::new().with_automock(false));
        let decisions = explain_modules(&project, &stats()).unwrap();
        assert!(decisions.iter().all(|d| !d.mock));
        assert_eq!(decisions[1].decision, "real (automock off)");
    }

    #[test]
    fn test_render_text_summary() {
        let project = project(MockConfig::new());
        let decisions = explain_modules(&project, &stats()).unwrap();
        let text = render_text(&decisions);
        assert!(text.contains("/app/src/foo.js"));
        assert!(text.ends_with("3 modules, 2 mocked by default"));
    }

    #[test]
    fn test_json_omits_missing_pattern() {
        let project = project(MockConfig::new());
        let decisions = explain_modules(&project, &stats()).unwrap();
        let json = serde_json::to_value(&decisions).unwrap();
        assert_eq!(json[1]["id"], 1);
        assert!(json[1].get("unmock_pattern").is_none());
    }
}
