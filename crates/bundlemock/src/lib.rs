//! Bundlemock: Mock-Aware Module Resolution for Bundled Tests
//!
//! A test harness normally applies its mocking rules per file path. Once a
//! bundler has flattened the application into numbered modules those paths
//! are gone; bundlemock re-implements the resolution rules over the
//! bundle's module-id graph instead.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  BUNDLEMOCK Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Test code  │    │ Runtime    │    │ Resolution Engine  │    │
//! │   │ require(7) │───►│ Facade     │───►│ (ModuleRegistry)   │    │
//! │   └────────────┘    └────────────┘    └─────────┬──────────┘    │
//! │                                                 │               │
//! │            ┌──────────────────┬─────────────────┼─────────┐     │
//! │            ▼                  ▼                 ▼         ▼     │
//! │     ┌────────────┐    ┌─────────────┐   ┌──────────┐ ┌───────┐  │
//! │     │ Instance   │    │ Set / manual│   │ Metadata │ │Unmock │  │
//! │     │ cache      │    │ / generated │   │ cache    │ │matcher│  │
//! │     └─────┬──────┘    │ mocks       │   └──────────┘ └───────┘  │
//! │           │ miss      └─────────────┘                           │
//! │           ▼                                                     │
//! │     ┌────────────────────────┐                                  │
//! │     │ ModuleGraph::instantiate│                                 │
//! │     └────────────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bundlemock::prelude::*;
//! use std::rc::Rc;
//!
//! let graph = BundleGraph::new()
//!     .module(0u32, "/app/__tests__/sum.test.js", |scope| scope.require(ModuleId(1)))
//!     .module(1u32, "/app/src/sum.js", |_| {
//!         Ok(ExportValue::function("sum", |_| ExportValue::number(3.0)))
//!     });
//! let runtime = Runtime::new(Rc::new(graph), Rc::new(MockConfig::new()))?;
//!
//! let sum = runtime.require(ModuleId(1))?;
//! assert!(sum.is_mock_function());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Project configuration (`package.json` / YAML)
pub mod config;
mod engine;
mod graph;
/// Manual mock discovery
pub mod manual_mock;
mod metadata;
mod registry;
mod result;
mod runtime;
mod stats;
mod unmock;
mod value;

pub use config::{BundleConfig, MockConfig, ProjectConfig};
pub use engine::{MockDecision, ModuleRegistry};
pub use graph::{BundleGraph, ModuleFactory, ModuleGraph, ModuleId, ModuleScope};
pub use manual_mock::{
    find_manual_mocks, link_manual_mocks, ManualMockLink, ManualMockProbe, MOCKS_DIR_NAME,
};
pub use metadata::{
    generate_from_metadata, get_metadata, ConstantValue, MockMetadata, NonFiniteNumber,
};
pub use registry::{ExplicitMock, RegistryCounts, RegistryState, ResetSummary};
pub use result::{BundleMockError, BundleMockResult};
pub use runtime::Runtime;
pub use stats::{BundleStats, StatsModule};
pub use unmock::UnmockMatcher;
pub use value::{ArrayValue, ExportValue, FunctionValue, NativeFn, ObjectValue};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        BundleGraph, BundleMockError, BundleMockResult, ExportValue, MockConfig, MockDecision,
        ModuleGraph, ModuleId, ModuleRegistry, ModuleScope, Runtime,
    };
}
