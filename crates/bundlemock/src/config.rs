//! Configuration
//!
//! Two sections, both usually read from the project's `package.json`:
//!
//! - `"jest"` → [`MockConfig`]: automock default, unmock patterns, entry id.
//!   Other harness keys in that section are ignored.
//! - `"bundlemock"` → [`BundleConfig`]: where the bundle's stats live and
//!   how bundled tests are laid out. Unknown keys are rejected.
//!
//! A YAML file with the same two top-level keys is accepted as well.

use crate::graph::ModuleId;
use crate::result::{BundleMockError, BundleMockResult};
use crate::unmock::UnmockMatcher;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Section of `package.json` holding [`MockConfig`]
pub const MOCK_SECTION: &str = "jest";

/// Section of `package.json` holding [`BundleConfig`]
pub const BUNDLE_SECTION: &str = "bundlemock";

/// Mocking behaviour for one registry
///
/// Registries built from the same `Rc<MockConfig>` share one compiled
/// [`UnmockMatcher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockConfig {
    /// Mock every module by default
    pub automock: bool,
    /// Path patterns exempt from default automocking
    pub unmocked_module_path_patterns: Vec<String>,
    /// Id of the entry (test file) module, never mocked
    pub entry_module_id: ModuleId,
    #[serde(skip)]
    matcher: OnceCell<Rc<UnmockMatcher>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            automock: true,
            unmocked_module_path_patterns: Vec::new(),
            entry_module_id: ModuleId::ENTRY,
            matcher: OnceCell::new(),
        }
    }
}

impl MockConfig {
    /// Create a config with defaults (automock on, no patterns, entry 0)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable default automocking
    #[must_use]
    pub fn with_automock(mut self, enabled: bool) -> Self {
        self.automock = enabled;
        self
    }

    /// Add an unmock pattern
    #[must_use]
    pub fn with_unmock_pattern(mut self, pattern: &str) -> Self {
        self.unmocked_module_path_patterns.push(pattern.to_string());
        self.matcher = OnceCell::new();
        self
    }

    /// Replace the unmock patterns
    #[must_use]
    pub fn with_unmock_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unmocked_module_path_patterns = patterns.into_iter().map(Into::into).collect();
        self.matcher = OnceCell::new();
        self
    }

    /// Set the entry module id
    #[must_use]
    pub fn with_entry_module(mut self, id: impl Into<ModuleId>) -> Self {
        self.entry_module_id = id.into();
        self
    }

    /// Compiled unmock patterns, compiled on first use and then shared
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a pattern does not compile.
    pub fn unmock_matcher(&self) -> BundleMockResult<Rc<UnmockMatcher>> {
        if let Some(matcher) = self.matcher.get() {
            return Ok(Rc::clone(matcher));
        }
        let patterns = self.unmocked_module_path_patterns.as_slice();
        let matcher = Rc::new(UnmockMatcher::compile(patterns)?);
        let _ = self.matcher.set(Rc::clone(&matcher));
        Ok(matcher)
    }
}

/// Layout of the bundled tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleConfig {
    /// Path of the bundler's stats file, relative to the project root
    pub stats_path: PathBuf,
    /// Glob of bundled test files
    pub bundled_tests_pattern: String,
    /// Glob of bundled test files to skip
    pub bundled_tests_ignore_pattern: String,
    /// Directories holding third-party packages
    pub modules_directories: Vec<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            stats_path: PathBuf::from("__bundled_tests__/stats.json"),
            bundled_tests_pattern: "__bundled_tests__/**".to_string(),
            bundled_tests_ignore_pattern: String::new(),
            modules_directories: vec!["node_modules".to_string()],
        }
    }
}

impl BundleConfig {
    /// Accepted option names
    pub const OPTIONS: [&'static str; 4] = [
        "statsPath",
        "bundledTestsPattern",
        "bundledTestsIgnorePattern",
        "modulesDirectories",
    ];

    /// Stats file path resolved against `root`
    #[must_use]
    pub fn stats_path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.stats_path)
    }

    fn from_section(section: &serde_json::Value) -> BundleMockResult<Self> {
        let Some(options) = section.as_object() else {
            return Err(BundleMockError::configuration(format!(
                "\"{BUNDLE_SECTION}\" must be an object"
            )));
        };
        if let Some(unknown) = options
            .keys()
            .find(|key| !Self::OPTIONS.contains(&key.as_str()))
        {
            return Err(BundleMockError::configuration(format!(
                "Unknown config option: {unknown}"
            )));
        }
        serde_json::from_value(section.clone()).map_err(|e| {
            BundleMockError::configuration(format!("Invalid \"{BUNDLE_SECTION}\" config: {e}"))
        })
    }
}

/// Everything loaded from a project config file
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    /// Mocking behaviour
    pub mock: MockConfig,
    /// Bundle layout
    pub bundle: BundleConfig,
    /// Directory containing the config file
    pub root: PathBuf,
}

impl ProjectConfig {
    /// Load from `package.json` or a YAML file, chosen by extension
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable, or invalid.
    pub fn load(path: &Path) -> BundleMockResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(path),
            _ => Self::from_package_json(path),
        }
    }

    /// Load from a `package.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable, or invalid.
    pub fn from_package_json(path: &Path) -> BundleMockResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            BundleMockError::configuration(format!(
                "Cannot find package.json at {}. \nError: {e}",
                path.display()
            ))
        })?;
        let document: serde_json::Value = serde_json::from_str(&text)?;
        Self::from_document(&document, root_of(path))
    }

    /// Load from a YAML file with `jest` and `bundlemock` keys
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable, or invalid.
    pub fn from_yaml(path: &Path) -> BundleMockResult<Self> {
        let text = fs::read_to_string(path)?;
        let document: serde_json::Value = serde_yaml_ng::from_str(&text)?;
        Self::from_document(&document, root_of(path))
    }

    /// Build from an already-parsed document
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid sections.
    pub fn from_document(document: &serde_json::Value, root: PathBuf) -> BundleMockResult<Self> {
        let mock = match document.get(MOCK_SECTION) {
            Some(section) => serde_json::from_value(section.clone()).map_err(|e| {
                BundleMockError::configuration(format!("Invalid \"{MOCK_SECTION}\" config: {e}"))
            })?,
            None => MockConfig::default(),
        };
        let bundle = match document.get(BUNDLE_SECTION) {
            Some(section) => BundleConfig::from_section(section)?,
            None => BundleConfig::default(),
        };
        Ok(Self { mock, bundle, root })
    }

    /// Stats file path resolved against the project root
    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.bundle.stats_path_in(&self.root)
    }
}

fn root_of(path: &Path) -> PathBuf {
    path.parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
