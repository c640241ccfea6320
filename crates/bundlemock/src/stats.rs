//! Bundle Stats Index
//!
//! The bundler's `stats.json` maps every numeric module id to the resolved
//! identifier (loader chain included). The index answers identifier lookups
//! without the bundle's code, so it doubles as a [`ModuleGraph`] for
//! inspecting mock decisions. It cannot execute modules.

use crate::graph::{ModuleGraph, ModuleId, ModuleScope};
use crate::manual_mock::LOADER_DELIMITER;
use crate::result::{BundleMockError, BundleMockResult};
use crate::value::ExportValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One module entry in the stats file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsModule {
    /// Module id
    pub id: ModuleId,
    /// Resolved identifier, possibly `loader!loader!/abs/path.js`
    pub identifier: String,
    /// Raw request as written in the source (`./foo`, `react`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StatsModule {
    /// Identifier with loader prefixes stripped
    #[must_use]
    pub fn resource_path(&self) -> &str {
        self.identifier
            .rsplit(LOADER_DELIMITER)
            .next()
            .unwrap_or(&self.identifier)
    }
}

#[derive(Deserialize)]
struct StatsDocument {
    #[serde(default)]
    modules: Vec<StatsModule>,
}

/// Index over the modules listed in a stats file
#[derive(Debug, Clone, Default)]
pub struct BundleStats {
    modules: Vec<StatsModule>,
    index: HashMap<ModuleId, usize>,
}

impl BundleStats {
    /// Load a stats file
    ///
    /// # Errors
    ///
    /// Returns a stats error if the file is missing or malformed.
    pub fn load(path: &Path) -> BundleMockResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            BundleMockError::stats(format!(
                "Cannot find bundle stats at {}: {e}",
                path.display()
            ))
        })?;
        let stats = Self::from_json_str(&text)?;
        debug!(path = %path.display(), modules = stats.len(), "bundle stats loaded");
        Ok(stats)
    }

    /// Parse stats JSON
    ///
    /// # Errors
    ///
    /// Returns a stats error if the JSON does not describe modules.
    pub fn from_json_str(text: &str) -> BundleMockResult<Self> {
        let document: StatsDocument = serde_json::from_str(text)
            .map_err(|e| BundleMockError::stats(format!("Malformed bundle stats: {e}")))?;
        Ok(Self::from_modules(document.modules))
    }

    /// Build from module entries; a later duplicate id wins
    #[must_use]
    pub fn from_modules(modules: Vec<StatsModule>) -> Self {
        let index = modules
            .iter()
            .enumerate()
            .map(|(position, module)| (module.id, position))
            .collect();
        Self { modules, index }
    }

    /// Entry for `id`
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&StatsModule> {
        self.index.get(&id).map(|&position| &self.modules[position])
    }

    /// Resolved identifier of `id`
    #[must_use]
    pub fn identifier(&self, id: ModuleId) -> Option<&str> {
        self.module(id).map(|module| module.identifier.as_str())
    }

    /// Whether `id` is listed
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.index.contains_key(&id)
    }

    /// Module ids in ascending order
    #[must_use]
    pub fn ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<_> = self.index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Module entries in file order
    pub fn modules(&self) -> impl Iterator<Item = &StatsModule> {
        self.modules.iter()
    }

    /// Number of distinct modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no modules are listed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Module whose resource path (loaders stripped) is `path`
    #[must_use]
    pub fn find_by_resource(&self, path: &Path) -> Option<&StatsModule> {
        self.modules
            .iter()
            .find(|module| Path::new(module.resource_path()) == path)
    }
}

impl ModuleGraph for BundleStats {
    fn module_identifier(&self, id: ModuleId) -> Option<String> {
        self.identifier(id).map(str::to_string)
    }

    fn contains(&self, id: ModuleId) -> bool {
        BundleStats::contains(self, id)
    }

    fn instantiate(
        &self,
        id: ModuleId,
        _scope: &dyn ModuleScope,
    ) -> BundleMockResult<ExportValue> {
        Err(BundleMockError::module_execution(
            id,
            "bundle stats carry no executable module code",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STATS: &str = r#"{
        "version": "1.12.2",
        "modules": [
            {"id": 0, "identifier": "/app/src/__tests__/foo.js", "name": "./src/__tests__/foo.js", "size": 120},
            {"id": 1, "identifier": "/app/node_modules/babel-loader/index.js!/app/src/foo.js", "name": "./src/foo.js"},
            {"id": 2, "identifier": "/app/node_modules/react/react.js"}
        ]
    }"#;

    #[test]
    fn test_parse_ignores_extra_fields() {
        let stats = BundleStats::from_json_str(STATS).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.ids(), vec![ModuleId(0), ModuleId(1), ModuleId(2)]);
        assert_eq!(stats.module(ModuleId(2)).unwrap().name, None);
    }

    #[test]
    fn test_resource_path_strips_loaders() {
        let stats = BundleStats::from_json_str(STATS).unwrap();
        let module = stats.module(ModuleId(1)).unwrap();
        assert_eq!(module.resource_path(), "/app/src/foo.js");
        assert_eq!(
            stats.find_by_resource(Path::new("/app/src/foo.js")).map(|m| m.id),
            Some(ModuleId(1))
        );
    }

    #[test]
    fn test_graph_lookup_and_no_execution() {
        struct NoScope;
        impl ModuleScope for NoScope {
            fn require(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
                Err(BundleMockError::UnknownModule { id })
            }

            fn exports(&self) -> ExportValue {
                ExportValue::object()
            }
        }

        let stats = BundleStats::from_json_str(STATS).unwrap();
        assert_eq!(
            stats.module_identifier(ModuleId(2)).as_deref(),
            Some("/app/node_modules/react/react.js")
        );
        assert!(!ModuleGraph::contains(&stats, ModuleId(9)));
        let err = stats.instantiate(ModuleId(2), &NoScope).unwrap_err();
        assert!(matches!(err, BundleMockError::ModuleExecution { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(STATS.as_bytes()).unwrap();
        let stats = BundleStats::load(file.path()).unwrap();
        assert!(stats.contains(ModuleId(0)));
    }

    #[test]
    fn test_missing_file_is_stats_error() {
        let err = BundleStats::load(Path::new("/definitely/missing/stats.json")).unwrap_err();
        assert!(matches!(err, BundleMockError::Stats { .. }));
        assert!(err.to_string().contains("Cannot find bundle stats"));
    }

    #[test]
    fn test_malformed_stats() {
        let err = BundleStats::from_json_str(r#"{"modules": 3}"#).unwrap_err();
        assert!(err.to_string().contains("Malformed bundle stats"));
    }
}
