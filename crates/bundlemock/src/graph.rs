//! Bundled Module Graph
//!
//! The bundler has already flattened the application into numbered
//! modules. This module defines how the resolver talks to that graph:
//!
//! - [`ModuleGraph`]: identifier lookup plus the execution primitive
//! - [`ModuleScope`]: the `require` handle a module factory receives, which
//!   routes dependency lookups back through the resolver (and its mocks)
//!   and hands out the module's own exports object
//! - [`BundleGraph`]: an in-memory graph of identifiers and factory closures

use crate::result::{BundleMockError, BundleMockResult};
use crate::value::ExportValue;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Opaque module identifier assigned by the bundler
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ModuleId(pub u32);

impl ModuleId {
    /// Conventional id of the entry (test file) module
    pub const ENTRY: Self = Self(0);

    /// Create a module id
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric id
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ModuleId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// `require` handle passed to a module while it executes
pub trait ModuleScope {
    /// Resolve a dependency (real module or mock, per the current rules)
    fn require(&self, id: ModuleId) -> BundleMockResult<ExportValue>;

    /// Exports object of the executing module.
    ///
    /// Dependents that require this module in a cycle already hold this
    /// object. Fill it in place and return it to keep one identity; returning
    /// a different value replaces it only for later requires.
    fn exports(&self) -> ExportValue;
}

/// The bundler's module graph, consumed by the resolver
pub trait ModuleGraph {
    /// Resolved identifier (path, possibly with loader prefixes) of a module
    fn module_identifier(&self, id: ModuleId) -> Option<String>;

    /// Whether the graph knows about `id`
    fn contains(&self, id: ModuleId) -> bool {
        self.module_identifier(id).is_some()
    }

    /// Execute a module and return its exports.
    ///
    /// Every call runs the module body again; caching is the caller's job.
    fn instantiate(&self, id: ModuleId, scope: &dyn ModuleScope)
        -> BundleMockResult<ExportValue>;
}

/// Module body: receives a `require` scope, returns the exports
pub type ModuleFactory = Box<dyn Fn(&dyn ModuleScope) -> BundleMockResult<ExportValue>>;

struct GraphModule {
    identifier: String,
    factory: ModuleFactory,
    executions: Cell<usize>,
}

/// In-memory module graph built from factory closures
///
/// # Example
///
/// ```rust,ignore
/// let graph = BundleGraph::new()
///     .module(0, "/app/__tests__/foo.test.js", |scope| scope.require(ModuleId(1)))
///     .module(1, "/app/src/foo.js", |scope| {
///         let exports = scope.exports();
///         exports.set("name", "foo".into());
///         Ok(exports)
///     });
/// ```
#[derive(Default)]
pub struct BundleGraph {
    modules: BTreeMap<ModuleId, GraphModule>,
}

impl fmt::Debug for BundleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleGraph")
            .field("module_count", &self.modules.len())
            .field("ids", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BundleGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module (builder style)
    #[must_use]
    pub fn module<F>(mut self, id: impl Into<ModuleId>, identifier: &str, factory: F) -> Self
    where
        F: Fn(&dyn ModuleScope) -> BundleMockResult<ExportValue> + 'static,
    {
        self.define(id, identifier, factory);
        self
    }

    /// Add or replace a module
    pub fn define<F>(&mut self, id: impl Into<ModuleId>, identifier: &str, factory: F)
    where
        F: Fn(&dyn ModuleScope) -> BundleMockResult<ExportValue> + 'static,
    {
        self.modules.insert(
            id.into(),
            GraphModule {
                identifier: identifier.to_string(),
                factory: Box::new(factory),
                executions: Cell::new(0),
            },
        );
    }

    /// How many times a module body has run
    #[must_use]
    pub fn execution_count(&self, id: impl Into<ModuleId>) -> usize {
        self.modules
            .get(&id.into())
            .map_or(0, |module| module.executions.get())
    }

    /// Module ids in ascending order
    #[must_use]
    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.keys().copied().collect()
    }

    /// Number of modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleGraph for BundleGraph {
    fn module_identifier(&self, id: ModuleId) -> Option<String> {
        self.modules.get(&id).map(|m| m.identifier.clone())
    }

    fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    fn instantiate(
        &self,
        id: ModuleId,
        scope: &dyn ModuleScope,
    ) -> BundleMockResult<ExportValue> {
        let module = self
            .modules
            .get(&id)
            .ok_or(BundleMockError::UnknownModule { id })?;
        module.executions.set(module.executions.get() + 1);
        debug!(module = %id, identifier = %module.identifier, "executing module body");
        (module.factory)(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDeps;

    impl ModuleScope for NoDeps {
        fn require(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
            Err(BundleMockError::UnknownModule { id })
        }

        fn exports(&self) -> ExportValue {
            ExportValue::object()
        }
    }

    #[test]
    fn test_module_id_display_and_conversion() {
        assert_eq!(ModuleId::from(12).to_string(), "12");
        assert_eq!(ModuleId::new(3).get(), 3);
        assert_eq!(ModuleId::ENTRY, ModuleId(0));
    }

    #[test]
    fn test_module_id_serializes_transparently() {
        let json = serde_json::to_string(&ModuleId(9)).unwrap();
        assert_eq!(json, "9");
    }

    #[test]
    fn test_bundle_graph_identifiers() {
        let graph = BundleGraph::new()
            .module(1u32, "/app/src/a.js", |_| Ok(ExportValue::object()))
            .module(2u32, "/app/src/b.js", |_| Ok(ExportValue::Null));

        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.module_identifier(ModuleId(2)).as_deref(),
            Some("/app/src/b.js")
        );
        assert!(graph.contains(ModuleId(1)));
        assert!(!graph.contains(ModuleId(3)));
        assert_eq!(graph.ids(), vec![ModuleId(1), ModuleId(2)]);
    }

    #[test]
    fn test_instantiate_counts_executions() {
        let graph = BundleGraph::new().module(1u32, "/a.js", |_| Ok(ExportValue::object()));

        graph.instantiate(ModuleId(1), &NoDeps).unwrap();
        graph.instantiate(ModuleId(1), &NoDeps).unwrap();
        assert_eq!(graph.execution_count(1u32), 2);
        assert_eq!(graph.execution_count(5u32), 0);
    }

    #[test]
    fn test_instantiate_unknown_module() {
        let graph = BundleGraph::new();
        let err = graph.instantiate(ModuleId(4), &NoDeps).unwrap_err();
        assert!(matches!(err, BundleMockError::UnknownModule { id } if id == ModuleId(4)));
    }

    #[test]
    fn test_factory_errors_propagate() {
        let graph = BundleGraph::new().module(1u32, "/a.js", |scope| scope.require(ModuleId(99)));
        let err = graph.instantiate(ModuleId(1), &NoDeps).unwrap_err();
        assert_eq!(err.module_id(), Some(ModuleId(99)));
    }
}
