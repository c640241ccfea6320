//! Resolution Engine
//!
//! Turns a module id into either the real exports or a mock, per request.
//!
//! ```text
//! resolve(id)
//!   ├─ entry module / require_actual ──────────────► resolve_real
//!   ├─ explicit flag ─────────── Mock ─────────────► resolve_mock
//!   │                           DontMock ──────────► resolve_real
//!   ├─ automock off ───────────────────────────────► resolve_real
//!   └─ automock on ── unmock pattern matches ──────► resolve_real
//!                     otherwise ───────────────────► resolve_mock
//!
//! resolve_mock(id): set mock ─► generated mock ─► generate_mock(id)
//! generate_mock(id): metadata (isolated run) ─► manual mock | synthesize
//! ```
//!
//! The registry is single-threaded. State lives behind `Rc<RefCell<_>>` and
//! no borrow is held while a module body runs, so module factories may call
//! back into the registry freely.

use crate::config::MockConfig;
use crate::graph::{ModuleGraph, ModuleId, ModuleScope};
use crate::metadata::{generate_from_metadata, get_metadata, MockMetadata};
use crate::registry::{
    ActualGuard, ExplicitMock, IsolationGuard, RegistryCounts, RegistryState, ResetSummary,
    SharedState,
};
use crate::result::{BundleMockError, BundleMockResult};
use crate::unmock::UnmockMatcher;
use crate::value::ExportValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Why a module resolves to a mock or to the real thing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDecision {
    /// The entry module is always real
    Entry,
    /// A `require_actual` call is in progress
    RequiringActual,
    /// Declared with `mock`, `dont_mock` or `set_mock`
    Explicit {
        /// Declared outcome
        mock: bool,
    },
    /// Automocking is off and nothing was declared
    AutomockDisabled,
    /// Path matched an unmock pattern
    UnmockPattern,
    /// Default automock
    Automock,
}

impl MockDecision {
    /// Whether the module is served as a mock
    #[must_use]
    pub const fn is_mock(self) -> bool {
        match self {
            Self::Explicit { mock } => mock,
            Self::Automock => true,
            Self::Entry | Self::RequiringActual | Self::AutomockDisabled | Self::UnmockPattern => {
                false
            }
        }
    }

    /// Short human-readable form
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Entry => "real (entry)",
            Self::RequiringActual => "real (require actual)",
            Self::Explicit { mock: true } => "mock (explicit)",
            Self::Explicit { mock: false } => "real (explicit)",
            Self::AutomockDisabled => "real (automock off)",
            Self::UnmockPattern => "real (unmock pattern)",
            Self::Automock => "mock",
        }
    }
}

impl fmt::Display for MockDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Mock-aware module registry for one test file run
///
/// Clones share the same state.
#[derive(Clone)]
pub struct ModuleRegistry {
    graph: Rc<dyn ModuleGraph>,
    config: Rc<MockConfig>,
    unmock: Rc<UnmockMatcher>,
    state: SharedState,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("entry_module", &self.config.entry_module_id)
            .field("unmock_patterns", &self.unmock.len())
            .field("counts", &self.counts())
            .finish_non_exhaustive()
    }
}

impl ModuleRegistry {
    /// Create a registry over `graph`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an unmock pattern is malformed.
    pub fn new(graph: Rc<dyn ModuleGraph>, config: Rc<MockConfig>) -> BundleMockResult<Self> {
        let unmock = config.unmock_matcher()?;
        let state = Rc::new(RefCell::new(RegistryState::new(config.automock)));
        debug!(
            automock = config.automock,
            patterns = unmock.len(),
            entry = %config.entry_module_id,
            "module registry created"
        );
        Ok(Self {
            graph,
            config,
            unmock,
            state,
        })
    }

    /// Configuration the registry was built from
    #[must_use]
    pub fn config(&self) -> &Rc<MockConfig> {
        &self.config
    }

    /// The module graph
    #[must_use]
    pub fn graph(&self) -> &Rc<dyn ModuleGraph> {
        &self.graph
    }

    /// Resolve a module: real exports or a mock
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` for ids outside the graph; module execution
    /// errors propagate unchanged.
    pub fn resolve(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        let decision = self.decide(id)?;
        trace!(module = %id, decision = %decision, "resolving");
        if decision.is_mock() {
            self.resolve_mock(id)
        } else {
            self.resolve_real(id)
        }
    }

    /// Compute the mock decision for `id` without resolving it
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` when the pattern check needs a path the graph
    /// does not have.
    pub fn decide(&self, id: ModuleId) -> BundleMockResult<MockDecision> {
        if id == self.config.entry_module_id {
            return Ok(MockDecision::Entry);
        }
        let (requiring_actual, explicit, automock, memo) = {
            let state = self.state.borrow();
            (
                state.is_requiring_actual(),
                state.explicit(id),
                state.automock,
                state.unmock_decisions.get(&id).copied(),
            )
        };
        if requiring_actual {
            return Ok(MockDecision::RequiringActual);
        }
        if let Some(mock) = explicit.decision() {
            return Ok(MockDecision::Explicit { mock });
        }
        if !automock {
            return Ok(MockDecision::AutomockDisabled);
        }
        let unmocked = match memo {
            Some(unmocked) => unmocked,
            None => {
                let path = self
                    .graph
                    .module_identifier(id)
                    .ok_or(BundleMockError::UnknownModule { id })?;
                let unmocked = self.unmock.matches(&path);
                if unmocked {
                    debug!(module = %id, path = %path, "exempt from automock by unmock pattern");
                }
                self.state.borrow_mut().unmock_decisions.insert(id, unmocked);
                unmocked
            }
        };
        Ok(if unmocked {
            MockDecision::UnmockPattern
        } else {
            MockDecision::Automock
        })
    }

    /// Real exports of `id`, instantiated at most once between resets
    ///
    /// The module body receives its exports object through
    /// [`ModuleScope::exports`] and the object is cached before the body
    /// runs, so a cyclic `require` of a module that is still loading gets
    /// the same, partially filled object.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` for ids outside the graph; module execution
    /// errors propagate unchanged and leave nothing cached. The exports
    /// object of a failed load is kept aside and filled by the next load.
    pub fn resolve_real(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        let cached = self.state.borrow().instances.get(&id).cloned();
        if let Some(exports) = cached {
            return Ok(exports);
        }
        if !self.graph.contains(id) {
            return Err(BundleMockError::UnknownModule { id });
        }

        let placeholder = {
            let mut state = self.state.borrow_mut();
            let placeholder = state
                .failed_loads
                .remove(&id)
                .unwrap_or_else(ExportValue::object);
            state.instances.insert(id, placeholder.clone());
            placeholder
        };
        let scope = LoadingScope {
            registry: self,
            exports: placeholder.clone(),
        };
        match self.graph.instantiate(id, &scope) {
            Ok(exports) => {
                if !exports.same_ref(&placeholder) {
                    trace!(module = %id, "module replaced its exports object");
                }
                self.state
                    .borrow_mut()
                    .instances
                    .insert(id, exports.clone());
                Ok(exports)
            }
            Err(e) => {
                let mut state = self.state.borrow_mut();
                state.instances.remove(&id);
                state.failed_loads.insert(id, placeholder);
                Err(e)
            }
        }
    }

    /// Mock for `id`: set mock, else cached automock, else a new automock
    ///
    /// # Errors
    ///
    /// Propagates errors from automock generation.
    pub fn resolve_mock(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        let existing = {
            let state = self.state.borrow();
            state
                .set_mocks
                .get(&id)
                .or_else(|| state.generated_mocks.get(&id))
                .cloned()
        };
        if let Some(mock) = existing {
            return Ok(mock);
        }

        let mock = self.generate_mock(id, false)?;
        self.state
            .borrow_mut()
            .generated_mocks
            .insert(id, mock.clone());
        Ok(mock)
    }

    /// A fresh automock of `id`, ignoring manual mocks and the mock cache
    ///
    /// # Errors
    ///
    /// Propagates errors from automock generation.
    pub fn gen_mock_from_module(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        self.generate_mock(id, true)
    }

    /// Real exports of `id`, with mocking suspended for nested requires
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_real`].
    pub fn require_actual(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        let _actual = ActualGuard::enter(&self.state);
        self.resolve_real(id)
    }

    fn generate_mock(&self, id: ModuleId, ignore_manual_mock: bool) -> BundleMockResult<ExportValue> {
        let has_metadata = self.state.borrow().metadata.contains_key(&id);
        if !has_metadata {
            self.capture_metadata(id)?;
        }

        if !ignore_manual_mock {
            let manual = self.state.borrow().manual_mocks.get(&id).copied();
            if let Some(mock_id) = manual {
                debug!(module = %id, manual_mock = %mock_id, "serving manual mock");
                return self.resolve_real(mock_id);
            }
        }

        let mock = self
            .state
            .borrow()
            .metadata
            .get(&id)
            .map(generate_from_metadata);
        mock.ok_or(BundleMockError::UnknownModule { id })
    }

    // The placeholder goes in before the module runs: a cyclic automock
    // request for `id` sees an empty object instead of recursing.
    fn capture_metadata(&self, id: ModuleId) -> BundleMockResult<()> {
        if !self.graph.contains(id) {
            return Err(BundleMockError::UnknownModule { id });
        }
        self.state
            .borrow_mut()
            .metadata
            .insert(id, MockMetadata::empty_object());

        let exports = {
            let _isolation = IsolationGuard::enter(&self.state);
            self.resolve_real(id)
        };

        match exports {
            Ok(exports) => {
                let metadata = get_metadata(&exports);
                debug!(
                    module = %id,
                    shape = metadata.type_name(),
                    members = metadata.member_count(),
                    "captured mock metadata"
                );
                self.state.borrow_mut().metadata.insert(id, metadata);
                Ok(())
            }
            Err(e) => {
                warn!(module = %id, error = %e, "module failed during automock analysis");
                self.state.borrow_mut().metadata.remove(&id);
                Err(e)
            }
        }
    }

    /// Declare `id` mocked (`true`) or real (`false`)
    pub fn set_explicit_mock(&self, id: ModuleId, should_mock: bool) {
        self.state
            .borrow_mut()
            .set_explicit(id, ExplicitMock::from_should_mock(should_mock));
    }

    /// Use `exports` as the mock for `id`
    pub fn set_mock(&self, id: ModuleId, exports: ExportValue) {
        let mut state = self.state.borrow_mut();
        state.set_mocks.insert(id, exports);
        state.set_explicit(id, ExplicitMock::Mock);
    }

    /// Serve the real exports of `mock_id` whenever `id` is automocked
    pub fn register_manual_mock(&self, id: ModuleId, mock_id: ModuleId) {
        debug!(module = %id, manual_mock = %mock_id, "manual mock registered");
        self.state.borrow_mut().manual_mocks.insert(id, mock_id);
    }

    /// Manual mock registered for `id`
    #[must_use]
    pub fn manual_mock_for(&self, id: ModuleId) -> Option<ModuleId> {
        self.state.borrow().manual_mocks.get(&id).copied()
    }

    /// Turn default automocking on or off
    pub fn set_automock(&self, enabled: bool) {
        self.state.borrow_mut().automock = enabled;
    }

    /// Whether default automocking is on
    #[must_use]
    pub fn is_automock_enabled(&self) -> bool {
        self.state.borrow().automock
    }

    /// Drop real instances, generated mocks and explicit declarations
    pub fn reset(&self) -> ResetSummary {
        let summary = self.state.borrow_mut().reset();
        debug!(
            instances = summary.instances,
            generated_mocks = summary.generated_mocks,
            declarations = summary.declarations,
            "module registry reset"
        );
        summary
    }

    /// Table sizes
    #[must_use]
    pub fn counts(&self) -> RegistryCounts {
        self.state.borrow().counts()
    }

    /// Cached shape snapshot for `id`
    #[must_use]
    pub fn metadata(&self, id: ModuleId) -> Option<MockMetadata> {
        self.state.borrow().metadata.get(&id).cloned()
    }

    /// Whether real exports of `id` are cached
    #[must_use]
    pub fn is_instantiated(&self, id: ModuleId) -> bool {
        self.state.borrow().instances.contains_key(&id)
    }
}

/// Scope a module body runs in while `resolve_real` loads it
struct LoadingScope<'a> {
    registry: &'a ModuleRegistry,
    exports: ExportValue,
}

impl ModuleScope for LoadingScope<'_> {
    fn require(&self, id: ModuleId) -> BundleMockResult<ExportValue> {
        self.registry.resolve(id)
    }

    fn exports(&self) -> ExportValue {
        self.exports.clone()
    }
}
