//! Manual Mock Probe
//!
//! A manual mock is a hand-written module in a `__mocks__` directory:
//!
//! - next to the source file for application modules
//!   (`src/foo.js` → `src/__mocks__/foo.js`)
//! - under the project root for packages
//!   (`react` → `<root>/__mocks__/react.js`)
//!
//! The probe finds those files; [`link_manual_mocks`] registers every hit
//! whose mock file is itself part of the bundle.

use crate::config::BundleConfig;
use crate::graph::ModuleId;
use crate::runtime::Runtime;
use crate::stats::BundleStats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Separator between loaders in a request or identifier
pub const LOADER_DELIMITER: char = '!';

/// Directory holding manual mocks
pub const MOCKS_DIR_NAME: &str = "__mocks__";

/// Request with any `loader!loader!` prefix removed
#[must_use]
pub fn strip_loaders(raw_request: &str) -> &str {
    raw_request
        .rsplit(LOADER_DELIMITER)
        .next()
        .unwrap_or(raw_request)
}

/// A request names a package when the resource lives in a modules directory
/// and the request is not relative or absolute.
#[must_use]
pub fn is_package<S: AsRef<str>>(
    raw_request: &str,
    resource_path: &str,
    modules_directories: &[S],
) -> bool {
    let in_modules_dir = modules_directories
        .iter()
        .any(|dir| resource_path.contains(dir.as_ref()));
    in_modules_dir && !raw_request.starts_with(['.', '/'])
}

/// Looks for manual mock files
#[derive(Debug, Clone)]
pub struct ManualMockProbe {
    root: PathBuf,
    modules_directories: Vec<String>,
}

impl ManualMockProbe {
    /// Probe rooted at `root`, with `node_modules` as the package directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modules_directories: BundleConfig::default().modules_directories,
        }
    }

    /// Replace the package directories
    #[must_use]
    pub fn with_modules_directories<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules_directories = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Probe configured from a bundle config
    #[must_use]
    pub fn from_config(root: impl Into<PathBuf>, config: &BundleConfig) -> Self {
        Self::new(root).with_modules_directories(config.modules_directories.iter().cloned())
    }

    /// Project root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the manual mock for a module would live
    #[must_use]
    pub fn mock_path_for(&self, raw_request: &str, resource_path: &str) -> PathBuf {
        let request = strip_loaders(raw_request);
        if is_package(request, resource_path, self.modules_directories.as_slice()) {
            let mut path = self.root.join(MOCKS_DIR_NAME).join(request);
            if path.extension().and_then(|ext| ext.to_str()) != Some("js") {
                let mut name = path.into_os_string();
                name.push(".js");
                path = PathBuf::from(name);
            }
            return path;
        }

        let resource = Path::new(resource_path);
        let dir = resource.parent().unwrap_or_else(|| Path::new(""));
        let file_name = resource.file_name().unwrap_or_default();
        dir.join(MOCKS_DIR_NAME).join(file_name)
    }

    /// Path of an existing manual mock for a module
    #[must_use]
    pub fn probe(&self, raw_request: &str, resource_path: &str) -> Option<PathBuf> {
        let path = self.mock_path_for(raw_request, resource_path);
        let found = path.is_file();
        trace!(mock = %path.display(), found, "probed for manual mock");
        found.then_some(path)
    }
}

/// A module linked to its manual mock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualMockLink {
    /// Mocked module
    pub id: ModuleId,
    /// Module holding the manual mock
    pub mock_id: ModuleId,
    /// Manual mock file
    pub mock_path: PathBuf,
}

/// Manual mocks the probe finds for bundle modules, in stats order
///
/// Modules inside a `__mocks__` directory are skipped, as are mock files
/// that the bundle does not contain.
#[must_use]
pub fn find_manual_mocks(stats: &BundleStats, probe: &ManualMockProbe) -> Vec<ManualMockLink> {
    stats
        .modules()
        .filter(|module| {
            !Path::new(module.resource_path())
                .components()
                .any(|part| part.as_os_str() == MOCKS_DIR_NAME)
        })
        .filter_map(|module| {
            let resource = module.resource_path();
            let request = module.name.as_deref().unwrap_or(resource);
            let mock_path = probe.probe(request, resource)?;
            let mock = stats.find_by_resource(&mock_path)?;
            Some(ManualMockLink {
                id: module.id,
                mock_id: mock.id,
                mock_path,
            })
        })
        .collect()
}

/// Register every manual mock found for the bundle with `runtime`
#[must_use = "the returned links describe what was registered"]
pub fn link_manual_mocks(
    stats: &BundleStats,
    probe: &ManualMockProbe,
    runtime: &Runtime,
) -> Vec<ManualMockLink> {
    let links = find_manual_mocks(stats, probe);
    for link in &links {
        runtime.register_manual_mock(link.id, link.mock_id);
    }
    debug!(linked = links.len(), "manual mocks linked");
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;
    use crate::stats::StatsModule;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "module.exports = {};").unwrap();
    }

    fn stats_module(id: u32, identifier: &Path, name: Option<&str>) -> StatsModule {
        StatsModule {
            id: ModuleId(id),
            identifier: identifier.display().to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_strip_loaders() {
        assert_eq!(strip_loaders("style!css!./foo.css"), "./foo.css");
        assert_eq!(strip_loaders("react"), "react");
    }

    #[test]
    fn test_is_package() {
        let dirs = ["node_modules"];
        assert!(is_package("react", "/app/node_modules/react/react.js", &dirs));
        assert!(!is_package("./react", "/app/node_modules/react/react.js", &dirs));
        assert!(!is_package("/abs/react", "/app/node_modules/react/react.js", &dirs));
        assert!(!is_package("foo", "/app/src/foo.js", &dirs));
    }

    #[test]
    fn test_mock_path_for_source_file() {
        let probe = ManualMockProbe::new("/app");
        assert_eq!(
            probe.mock_path_for("./baz", "/app/src/baz/baz.js"),
            PathBuf::from("/app/src/baz/__mocks__/baz.js")
        );
    }

    #[test]
    fn test_mock_path_for_package() {
        let probe = ManualMockProbe::new("/app");
        assert_eq!(
            probe.mock_path_for("babel!react", "/app/node_modules/react/react.js"),
            PathBuf::from("/app/__mocks__/react.js")
        );
        assert_eq!(
            probe.mock_path_for("lodash/map.js", "/app/node_modules/lodash/map.js"),
            PathBuf::from("/app/__mocks__/lodash/map.js")
        );
    }

    #[test]
    fn test_custom_modules_directories() {
        let probe = ManualMockProbe::new("/app").with_modules_directories(["web_modules"]);
        assert_eq!(
            probe.mock_path_for("widget", "/app/web_modules/widget/index.js"),
            PathBuf::from("/app/__mocks__/widget.js")
        );
    }

    #[test]
    fn test_probe_requires_regular_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src/baz.js");
        let probe = ManualMockProbe::new(dir.path());

        assert!(probe.probe("./baz", source.to_str().unwrap()).is_none());

        fs::create_dir_all(dir.path().join("src/__mocks__/baz.js")).unwrap();
        assert!(probe.probe("./baz", source.to_str().unwrap()).is_none());
    }

    #[test]
    fn test_link_manual_mocks_registers_bundled_mocks() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let baz = root.join("src/baz/baz.js");
        let baz_mock = root.join("src/baz/__mocks__/baz.js");
        let foo = root.join("src/foo/foo.js");
        let lonely = root.join("src/qux/qux.js");
        let lonely_mock = root.join("src/qux/__mocks__/qux.js");
        for path in [&baz, &baz_mock, &foo, &lonely, &lonely_mock] {
            touch(path);
        }

        let stats = BundleStats::from_modules(vec![
            stats_module(1, &baz, Some("./baz")),
            stats_module(2, &baz_mock, None),
            stats_module(3, &foo, Some("./foo")),
            stats_module(4, &lonely, Some("./qux")),
        ]);
        let probe = ManualMockProbe::new(root);
        let runtime = Runtime::new(Rc::new(stats.clone()), Rc::new(MockConfig::new())).unwrap();

        let links = link_manual_mocks(&stats, &probe, &runtime);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, ModuleId(1));
        assert_eq!(links[0].mock_id, ModuleId(2));
        assert_eq!(
            runtime.registry().manual_mock_for(ModuleId(1)),
            Some(ModuleId(2))
        );
        assert_eq!(runtime.registry().manual_mock_for(ModuleId(4)), None);
    }
}
