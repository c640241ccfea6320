//! Module and Mock Registries
//!
//! All per-run mutable state of one resolver lives in [`RegistryState`],
//! shared behind `Rc<RefCell<_>>` between the resolver and its clones.
//!
//! | Table | Cleared on reset |
//! |-------|------------------|
//! | real instances | yes |
//! | exports of failed loads | yes |
//! | generated mocks | yes |
//! | explicit mock flags | yes |
//! | explicit set mocks | yes |
//! | mock metadata | no |
//! | manual mock map | no |
//! | unmock decisions | no |
//!
//! Two RAII guards scope temporary state changes so the original state
//! comes back on every exit path, panics included:
//!
//! - [`IsolationGuard`] swaps in empty instance, failed-load and mock tables
//!   while a module is executed for automock analysis
//! - [`ActualGuard`] marks a `require_actual` call as in progress

use crate::graph::ModuleId;
use crate::metadata::MockMetadata;
use crate::value::ExportValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

/// Exports keyed by module id
pub type ModuleTable = HashMap<ModuleId, ExportValue>;

/// Explicit per-module mock declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplicitMock {
    /// Declared with `mock`/`set_mock`: always mock
    Mock,
    /// Declared with `dont_mock`: never mock
    DontMock,
    /// No declaration: defer to the automock default
    #[default]
    Unset,
}

impl ExplicitMock {
    /// Declared decision, `None` when unset
    #[must_use]
    pub const fn decision(self) -> Option<bool> {
        match self {
            Self::Mock => Some(true),
            Self::DontMock => Some(false),
            Self::Unset => None,
        }
    }

    /// Declaration from a should-mock boolean
    #[must_use]
    pub const fn from_should_mock(should_mock: bool) -> Self {
        if should_mock {
            Self::Mock
        } else {
            Self::DontMock
        }
    }
}

/// Table sizes, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryCounts {
    /// Real module instances
    pub instances: usize,
    /// Generated automocks
    pub generated_mocks: usize,
    /// Explicit set mocks
    pub set_mocks: usize,
    /// Explicit mock flags
    pub explicit_flags: usize,
    /// Manual mock registrations
    pub manual_mocks: usize,
    /// Cached metadata snapshots
    pub metadata: usize,
}

/// What a reset dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetSummary {
    /// Real instances dropped
    pub instances: usize,
    /// Generated mocks dropped
    pub generated_mocks: usize,
    /// Explicit declarations (flags and set mocks) dropped
    pub declarations: usize,
}

/// Mutable state of one resolver
#[derive(Debug)]
pub struct RegistryState {
    pub(crate) instances: ModuleTable,
    // Exports objects of loads that failed. Dependents in a cycle may hold
    // one; the next load of that id fills it instead of a new object.
    pub(crate) failed_loads: ModuleTable,
    pub(crate) generated_mocks: ModuleTable,
    pub(crate) set_mocks: ModuleTable,
    explicit: HashMap<ModuleId, ExplicitMock>,
    pub(crate) manual_mocks: HashMap<ModuleId, ModuleId>,
    pub(crate) metadata: HashMap<ModuleId, MockMetadata>,
    pub(crate) unmock_decisions: HashMap<ModuleId, bool>,
    pub(crate) requiring_actual: u32,
    pub(crate) automock: bool,
}

impl RegistryState {
    /// Fresh state with the given automock default
    #[must_use]
    pub fn new(automock: bool) -> Self {
        Self {
            instances: ModuleTable::new(),
            failed_loads: ModuleTable::new(),
            generated_mocks: ModuleTable::new(),
            set_mocks: ModuleTable::new(),
            explicit: HashMap::new(),
            manual_mocks: HashMap::new(),
            metadata: HashMap::new(),
            unmock_decisions: HashMap::new(),
            requiring_actual: 0,
            automock,
        }
    }

    /// Explicit declaration for `id`
    #[must_use]
    pub fn explicit(&self, id: ModuleId) -> ExplicitMock {
        self.explicit.get(&id).copied().unwrap_or_default()
    }

    /// Record (or clear, with `Unset`) an explicit declaration
    pub fn set_explicit(&mut self, id: ModuleId, flag: ExplicitMock) {
        match flag {
            ExplicitMock::Unset => {
                self.explicit.remove(&id);
            }
            _ => {
                self.explicit.insert(id, flag);
            }
        }
    }

    /// Whether a `require_actual` call is in progress
    #[must_use]
    pub const fn is_requiring_actual(&self) -> bool {
        self.requiring_actual > 0
    }

    /// Drop per-test state; keep metadata, manual mocks and unmock decisions
    pub fn reset(&mut self) -> ResetSummary {
        let summary = ResetSummary {
            instances: self.instances.len(),
            generated_mocks: self.generated_mocks.len(),
            declarations: self.explicit.len() + self.set_mocks.len(),
        };
        self.instances.clear();
        self.failed_loads.clear();
        self.generated_mocks.clear();
        self.explicit.clear();
        self.set_mocks.clear();
        self.requiring_actual = 0;
        summary
    }

    /// Table sizes
    #[must_use]
    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            instances: self.instances.len(),
            generated_mocks: self.generated_mocks.len(),
            set_mocks: self.set_mocks.len(),
            explicit_flags: self.explicit.len(),
            manual_mocks: self.manual_mocks.len(),
            metadata: self.metadata.len(),
        }
    }
}

pub(crate) type SharedState = Rc<RefCell<RegistryState>>;

/// Runs a module against empty instance and mock tables.
///
/// Entering takes the live tables out of the state; dropping puts them
/// back and discards whatever the isolated run cached.
pub(crate) struct IsolationGuard {
    state: SharedState,
    instances: ModuleTable,
    failed_loads: ModuleTable,
    generated_mocks: ModuleTable,
}

impl IsolationGuard {
    pub(crate) fn enter(state: &SharedState) -> Self {
        let (instances, failed_loads, generated_mocks) = {
            let mut s = state.borrow_mut();
            (
                mem::take(&mut s.instances),
                mem::take(&mut s.failed_loads),
                mem::take(&mut s.generated_mocks),
            )
        };
        Self {
            state: Rc::clone(state),
            instances,
            failed_loads,
            generated_mocks,
        }
    }
}

impl Drop for IsolationGuard {
    fn drop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.instances = mem::take(&mut self.instances);
        s.failed_loads = mem::take(&mut self.failed_loads);
        s.generated_mocks = mem::take(&mut self.generated_mocks);
    }
}

/// Marks a `require_actual` call as in progress for its lifetime
pub(crate) struct ActualGuard {
    state: SharedState,
}

impl ActualGuard {
    pub(crate) fn enter(state: &SharedState) -> Self {
        state.borrow_mut().requiring_actual += 1;
        Self {
            state: Rc::clone(state),
        }
    }
}

impl Drop for ActualGuard {
    fn drop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.requiring_actual = s.requiring_actual.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn shared() -> SharedState {
        Rc::new(RefCell::new(RegistryState::new(true)))
    }

    #[test]
    fn test_explicit_tri_state() {
        let mut state = RegistryState::new(true);
        assert_eq!(state.explicit(ModuleId(1)), ExplicitMock::Unset);

        state.set_explicit(ModuleId(1), ExplicitMock::DontMock);
        assert_eq!(state.explicit(ModuleId(1)).decision(), Some(false));

        state.set_explicit(ModuleId(1), ExplicitMock::Unset);
        assert_eq!(state.explicit(ModuleId(1)).decision(), None);
        assert_eq!(state.counts().explicit_flags, 0);
    }

    #[test]
    fn test_from_should_mock() {
        assert_eq!(ExplicitMock::from_should_mock(true), ExplicitMock::Mock);
        assert_eq!(ExplicitMock::from_should_mock(false), ExplicitMock::DontMock);
    }

    #[test]
    fn test_reset_keeps_metadata_and_manual_mocks() {
        let mut state = RegistryState::new(true);
        state.instances.insert(ModuleId(1), ExportValue::object());
        state.failed_loads.insert(ModuleId(8), ExportValue::object());
        state.generated_mocks.insert(ModuleId(2), ExportValue::object());
        state.set_mocks.insert(ModuleId(3), ExportValue::Null);
        state.set_explicit(ModuleId(3), ExplicitMock::Mock);
        state.manual_mocks.insert(ModuleId(4), ModuleId(5));
        state.metadata.insert(ModuleId(2), MockMetadata::empty_object());
        state.unmock_decisions.insert(ModuleId(6), false);

        let summary = state.reset();
        assert_eq!(summary.instances, 1);
        assert_eq!(summary.generated_mocks, 1);
        assert_eq!(summary.declarations, 2);

        assert!(state.failed_loads.is_empty());
        let counts = state.counts();
        assert_eq!(counts.instances, 0);
        assert_eq!(counts.generated_mocks, 0);
        assert_eq!(counts.set_mocks, 0);
        assert_eq!(counts.explicit_flags, 0);
        assert_eq!(counts.manual_mocks, 1);
        assert_eq!(counts.metadata, 1);
        assert_eq!(state.unmock_decisions.get(&ModuleId(6)), Some(&false));
    }

    #[test]
    fn test_isolation_guard_swaps_and_restores() {
        let state = shared();
        let real = ExportValue::object();
        state.borrow_mut().instances.insert(ModuleId(1), real.clone());

        {
            let _guard = IsolationGuard::enter(&state);
            assert!(state.borrow().instances.is_empty());
            let mut s = state.borrow_mut();
            s.instances.insert(ModuleId(2), ExportValue::object());
            s.failed_loads.insert(ModuleId(3), ExportValue::object());
        }

        let s = state.borrow();
        assert!(s.failed_loads.is_empty());
        assert_eq!(s.instances.len(), 1);
        assert!(s.instances[&ModuleId(1)].same_ref(&real));
        assert!(!s.instances.contains_key(&ModuleId(2)));
    }

    #[test]
    fn test_isolation_guard_restores_on_panic() {
        let state = shared();
        state
            .borrow_mut()
            .generated_mocks
            .insert(ModuleId(7), ExportValue::Null);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = IsolationGuard::enter(&state);
            panic!("module body blew up");
        }));

        assert!(result.is_err());
        assert!(state.borrow().generated_mocks.contains_key(&ModuleId(7)));
    }

    #[test]
    fn test_actual_guard_nests() {
        let state = shared();
        {
            let _outer = ActualGuard::enter(&state);
            {
                let _inner = ActualGuard::enter(&state);
                assert_eq!(state.borrow().requiring_actual, 2);
            }
            assert!(state.borrow().is_requiring_actual());
        }
        assert!(!state.borrow().is_requiring_actual());
    }

    #[test]
    fn test_actual_guard_survives_reset() {
        let state = shared();
        {
            let _guard = ActualGuard::enter(&state);
            state.borrow_mut().reset();
        }
        assert_eq!(state.borrow().requiring_actual, 0);
    }
}
