//! Runtime Facade
//!
//! The surface test code (and the build-time rewrite) talks to. Every call
//! forwards to the [`ModuleRegistry`]; declaration methods return `&Self` so
//! they chain:
//!
//! ```rust,ignore
//! runtime.dont_mock(ModuleId(3)).mock(ModuleId(4));
//! let subject = runtime.require(ModuleId(3))?;
//! ```

use crate::config::MockConfig;
use crate::engine::ModuleRegistry;
use crate::graph::{ModuleGraph, ModuleId};
use crate::result::BundleMockResult;
use crate::value::ExportValue;
use std::rc::Rc;
use tracing::debug;

/// Mocking runtime for one test file run
#[derive(Debug, Clone)]
pub struct Runtime {
    registry: ModuleRegistry,
}

impl Runtime {
    /// Create a runtime over `graph`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an unmock pattern is malformed.
    pub fn new(graph: Rc<dyn ModuleGraph>, config: Rc<MockConfig>) -> BundleMockResult<Self> {
        Ok(Self {
            registry: ModuleRegistry::new(graph, config)?,
        })
    }

    /// Wrap an existing registry
    #[must_use]
    pub const fn from_registry(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Always mock `id`
    pub fn mock(&self, id: ModuleId) -> &Self {
        self.registry.set_explicit_mock(id, true);
        self
    }

    /// Never mock `id`
    pub fn dont_mock(&self, id: ModuleId) -> &Self {
        self.registry.set_explicit_mock(id, false);
        self
    }

    /// Serve `exports` whenever `id` is required
    pub fn set_mock(&self, id: ModuleId, exports: ExportValue) -> &Self {
        self.registry.set_mock(id, exports);
        self
    }

    /// Link a manual mock module to `id`
    pub fn register_manual_mock(&self, id: ModuleId, mock_id: ModuleId) -> &Self {
        self.registry.register_manual_mock(id, mock_id);
        self
    }

    /// Mock modules by default
    pub fn automock_on(&self) -> &Self {
        self.registry.set_automock(true);
        self
    }

    /// Use real modules by default
    pub fn automock_off(&self) -> &Self {
        self.registry.set_automock(false);
        self
    }

    /// Forget real instances, generated mocks and declarations
    pub fn reset_module_registry(&self) -> &Self {
        self.registry.reset();
        self
    }

    /// Resolve `id` under the current mocking rules
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` for ids outside the graph; module execution
    /// errors propagate unchanged.
    pub fn require(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        self.registry.resolve(id)
    }

    /// Real exports of `id`, whatever the mocking rules say
    ///
    /// # Errors
    ///
    /// Same as [`Self::require`].
    pub fn require_actual(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        self.registry.require_actual(id)
    }

    /// A fresh automock of `id`, ignoring manual mocks
    ///
    /// # Errors
    ///
    /// Same as [`Self::require`].
    pub fn gen_mock_from_module(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        self.registry.gen_mock_from_module(id)
    }

    /// A standalone inert mock function
    #[must_use]
    pub fn gen_mock_function(&self) -> ExportValue {
        debug!("standalone mock function created");
        ExportValue::mock_function("mockConstructor")
    }

    /// Whether `id` would currently resolve to a mock
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` if the pattern check needs an unknown path.
    pub fn is_mocked(&self, id: ModuleId) -> BundleMockResult<bool> {
        Ok(self.registry.decide(id)?.is_mock())
    }
}
