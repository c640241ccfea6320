//! Property-based tests for bundlemock.
//!
//! Uses proptest to check resolution invariants over arbitrary declaration
//! sequences and export shapes.

#![allow(clippy::unwrap_used)]

use bundlemock::prelude::*;
use bundlemock::{get_metadata, generate_from_metadata};
use proptest::prelude::*;
use std::rc::Rc;

const MODULES: u32 = 6;

fn flat_graph() -> Rc<BundleGraph> {
    let mut graph = BundleGraph::new();
    for raw in 1..=MODULES {
        let path = if raw % 2 == 0 {
            format!("/vendor/pkg{raw}.js")
        } else {
            format!("/app/src/mod{raw}.js")
        };
        graph.define(raw, &path, move |_| {
            Ok(ExportValue::object_with([
                ("id", ExportValue::number(f64::from(raw))),
                ("run", ExportValue::function("run", |_| ExportValue::Null)),
            ]))
        });
    }
    Rc::new(graph)
}

#[derive(Debug, Clone)]
enum Op {
    Mock(u32),
    DontMock(u32),
    Require(u32),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1..=MODULES).prop_map(Op::Mock),
        (1..=MODULES).prop_map(Op::DontMock),
        (1..=MODULES).prop_map(Op::Require),
        Just(Op::Reset),
    ]
}

// === Declaration Property Tests ===

proptest! {
    /// The last declaration before a reset decides; a reset forgets it.
    #[test]
    fn prop_last_declaration_wins(ops in prop::collection::vec(op(), 1..40)) {
        let graph = flat_graph();
        let runtime = Runtime::new(
            graph,
            Rc::new(MockConfig::new().with_unmock_pattern("^/vendor/")),
        ).unwrap();
        let mut declared: [Option<bool>; MODULES as usize + 1] = [None; MODULES as usize + 1];

        for op in ops {
            match op {
                Op::Mock(raw) => {
                    runtime.mock(ModuleId(raw));
                    declared[raw as usize] = Some(true);
                }
                Op::DontMock(raw) => {
                    runtime.dont_mock(ModuleId(raw));
                    declared[raw as usize] = Some(false);
                }
                Op::Require(raw) => {
                    prop_assert!(runtime.require(ModuleId(raw)).is_ok());
                }
                Op::Reset => {
                    runtime.reset_module_registry();
                    declared = [None; MODULES as usize + 1];
                }
            }
        }

        for raw in 1..=MODULES {
            let default = raw % 2 == 1;
            let expected = declared[raw as usize].unwrap_or(default);
            prop_assert_eq!(runtime.is_mocked(ModuleId(raw)).unwrap(), expected);
        }
    }

    /// Without automocking, a module body runs once per reset epoch it is required in.
    #[test]
    fn prop_real_instantiation_once_per_epoch(ops in prop::collection::vec(op(), 1..40)) {
        let graph = flat_graph();
        let runtime = Runtime::new(
            graph.clone(),
            Rc::new(MockConfig::new().with_automock(false)),
        ).unwrap();
        let mut required_this_epoch = [false; MODULES as usize + 1];
        let mut expected = [0usize; MODULES as usize + 1];

        for op in ops {
            match op {
                Op::Require(raw) => {
                    let first = runtime.require(ModuleId(raw)).unwrap();
                    let second = runtime.require(ModuleId(raw)).unwrap();
                    prop_assert!(first.same_ref(&second));
                    if !required_this_epoch[raw as usize] {
                        required_this_epoch[raw as usize] = true;
                        expected[raw as usize] += 1;
                    }
                }
                Op::Reset => {
                    runtime.reset_module_registry();
                    required_this_epoch = [false; MODULES as usize + 1];
                }
                // declarations would turn on mocking; only track real loads here
                Op::Mock(_) | Op::DontMock(_) => {}
            }
        }

        for raw in 1..=MODULES {
            prop_assert_eq!(graph.execution_count(raw), expected[raw as usize]);
        }
    }

    /// Each module is analysed for automocking at most once per registry.
    #[test]
    fn prop_metadata_captured_once(
        requires in prop::collection::vec(1..=MODULES, 1..30),
        resets in prop::collection::vec(any::<bool>(), 1..30)
    ) {
        let graph = flat_graph();
        let runtime = Runtime::new(graph.clone(), Rc::new(MockConfig::new())).unwrap();

        for (raw, reset) in requires.iter().zip(resets.iter().cycle()) {
            let mock = runtime.require(ModuleId(*raw)).unwrap();
            prop_assert!(mock.get("run").unwrap().is_mock_function());
            if *reset {
                runtime.reset_module_registry();
            }
        }

        for raw in 1..=MODULES {
            let analysed = requires.contains(&raw);
            prop_assert_eq!(graph.execution_count(raw), usize::from(analysed));
        }
    }
}

// === Metadata Property Tests ===

fn constant() -> impl Strategy<Value = ExportValue> {
    prop_oneof![
        any::<bool>().prop_map(ExportValue::from),
        (-1.0e6..1.0e6f64).prop_map(ExportValue::number),
        "[a-z]{0,12}".prop_map(ExportValue::string),
    ]
}

fn member() -> impl Strategy<Value = ExportValue> {
    prop_oneof![
        constant(),
        Just(ExportValue::Null),
        "[a-z]{1,8}".prop_map(|name| ExportValue::function(&name, |_| ExportValue::Null)),
    ]
}

proptest! {
    /// Automocks keep member names; constants pass through; functions become mocks.
    #[test]
    fn prop_automock_preserves_shape(
        members in prop::collection::btree_map("[a-z]{1,10}", member(), 0..12)
    ) {
        let exports = ExportValue::object_with(members.clone());
        let mock = generate_from_metadata(&get_metadata(&exports));

        prop_assert_eq!(mock.keys(), exports.keys());
        for (key, original) in &members {
            let mocked = mock.get(key).unwrap();
            prop_assert_eq!(mocked.type_name(), original.type_name());
            if original.as_function().is_some() {
                prop_assert!(mocked.is_mock_function());
            } else {
                prop_assert_eq!(mocked.as_str(), original.as_str());
                prop_assert_eq!(mocked.as_bool(), original.as_bool());
                prop_assert_eq!(mocked.as_f64(), original.as_f64());
            }
        }
    }

    /// Two automocks from one snapshot never share references.
    #[test]
    fn prop_generated_mocks_independent(
        members in prop::collection::btree_map("[a-z]{1,10}", member(), 1..8)
    ) {
        let metadata = get_metadata(&ExportValue::object_with(members));
        let first = generate_from_metadata(&metadata);
        let second = generate_from_metadata(&metadata);

        prop_assert!(!first.same_ref(&second));
        for key in first.keys() {
            let a = first.get(&key).unwrap();
            let b = second.get(&key).unwrap();
            if a.as_function().is_some() {
                prop_assert!(!a.same_ref(&b));
            }
        }
    }
}
