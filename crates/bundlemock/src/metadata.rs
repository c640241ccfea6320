//! Mock Metadata
//!
//! Automocks are never deep copies of live exports: closures cannot be
//! duplicated safely, and re-running a module to get a fresh copy would
//! repeat its side effects. Instead the resolver snapshots the *shape* of a
//! module's exports once ([`get_metadata`]) and synthesizes as many inert
//! instances as it needs from that snapshot ([`generate_from_metadata`]).
//!
//! ```text
//! real exports ──get_metadata──► MockMetadata ──generate_from_metadata──► automock
//!                                 (cached)                                (fresh each call)
//! ```
//!
//! Shared and cyclic references survive the round trip: every object, array
//! and function is numbered in visit order, and repeat visits are recorded as
//! [`MockMetadata::Ref`] to that number.

use crate::value::{ArrayValue, ExportValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Constant carried through to the mock unchanged
///
/// Finite numbers serialize as JSON numbers. NaN and the infinities have no
/// JSON number form and serialize as `{"nonFinite": "NaN"}` and the like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    /// Boolean constant
    Bool(bool),
    /// Finite number constant
    Number(f64),
    /// String constant
    String(String),
    /// NaN or an infinity
    NonFinite {
        /// Which one
        #[serde(rename = "nonFinite")]
        non_finite: NonFiniteNumber,
    },
}

impl ConstantValue {
    /// Number constant, tagged when it is not finite
    #[must_use]
    pub fn number(value: f64) -> Self {
        NonFiniteNumber::from_f64(value)
            .map_or(Self::Number(value), |non_finite| Self::NonFinite { non_finite })
    }
}

/// Number with no JSON representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonFiniteNumber {
    /// Not a number
    #[serde(rename = "NaN")]
    NaN,
    /// Positive infinity
    #[serde(rename = "Infinity")]
    Infinity,
    /// Negative infinity
    #[serde(rename = "-Infinity")]
    NegInfinity,
}

impl NonFiniteNumber {
    /// Classify `value`, `None` when it is finite
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_nan() {
            Some(Self::NaN)
        } else if value == f64::INFINITY {
            Some(Self::Infinity)
        } else if value == f64::NEG_INFINITY {
            Some(Self::NegInfinity)
        } else {
            None
        }
    }

    /// The number itself
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::NaN => f64::NAN,
            Self::Infinity => f64::INFINITY,
            Self::NegInfinity => f64::NEG_INFINITY,
        }
    }
}

impl From<&ConstantValue> for ExportValue {
    fn from(value: &ConstantValue) -> Self {
        match value {
            ConstantValue::Bool(b) => Self::Bool(*b),
            ConstantValue::Number(n) => Self::Number(*n),
            ConstantValue::String(s) => Self::String(s.clone()),
            ConstantValue::NonFinite { non_finite } => Self::Number(non_finite.value()),
        }
    }
}

/// Serializable shape of a module's exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MockMetadata {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Primitive constant
    Constant {
        /// The constant
        value: ConstantValue,
    },
    /// Object with named members
    Object {
        /// Reference number
        id: u32,
        /// Member shapes
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        members: BTreeMap<String, MockMetadata>,
    },
    /// Array with positional items
    Array {
        /// Reference number
        id: u32,
        /// Item shapes
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        items: Vec<MockMetadata>,
    },
    /// Function with static members
    Function {
        /// Reference number
        id: u32,
        /// Function name
        name: String,
        /// Static member shapes
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        members: BTreeMap<String, MockMetadata>,
    },
    /// Repeat visit of an object, array or function
    Ref {
        /// Reference number of the earlier visit
        target: u32,
    },
}

impl MockMetadata {
    /// Shape of an empty object.
    ///
    /// Stored as a placeholder while a module is being analyzed so that a
    /// cyclic automock request sees an empty mock instead of recursing.
    #[must_use]
    pub const fn empty_object() -> Self {
        Self::Object {
            id: 0,
            members: BTreeMap::new(),
        }
    }

    /// Shape type name
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Constant { .. } => "constant",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Function { .. } => "function",
            Self::Ref { .. } => "ref",
        }
    }

    /// Number of direct members (or items)
    #[must_use]
    pub fn member_count(&self) -> usize {
        match self {
            Self::Object { members, .. } | Self::Function { members, .. } => members.len(),
            Self::Array { items, .. } => items.len(),
            _ => 0,
        }
    }

    /// Direct member shape by name (or index, for arrays)
    #[must_use]
    pub fn member(&self, key: &str) -> Option<&MockMetadata> {
        match self {
            Self::Object { members, .. } | Self::Function { members, .. } => members.get(key),
            Self::Array { items, .. } => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }
}

/// Snapshot the shape of an export value
#[must_use]
pub fn get_metadata(value: &ExportValue) -> MockMetadata {
    MetadataExtractor::default().visit(value)
}

/// Build a fresh, inert mock from a shape snapshot.
///
/// Functions become mock functions with the same name and mocked static
/// members; objects and arrays keep their members with mocked values;
/// constants pass through.
#[must_use]
pub fn generate_from_metadata(metadata: &MockMetadata) -> ExportValue {
    MockSynthesizer::default().build(metadata)
}

enum Visit {
    First(u32),
    Repeat(u32),
}

#[derive(Default)]
struct MetadataExtractor {
    seen: HashMap<usize, u32>,
    next_id: u32,
}

impl MetadataExtractor {
    fn enter(&mut self, value: &ExportValue) -> Visit {
        let Some(addr) = value.ref_addr() else {
            return Visit::First(self.next_id);
        };
        if let Some(&target) = self.seen.get(&addr) {
            return Visit::Repeat(target);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.seen.insert(addr, id);
        Visit::First(id)
    }

    fn visit(&mut self, value: &ExportValue) -> MockMetadata {
        match value {
            ExportValue::Undefined => MockMetadata::Undefined,
            ExportValue::Null => MockMetadata::Null,
            ExportValue::Bool(b) => MockMetadata::Constant {
                value: ConstantValue::Bool(*b),
            },
            ExportValue::Number(n) => MockMetadata::Constant {
                value: ConstantValue::number(*n),
            },
            ExportValue::String(s) => MockMetadata::Constant {
                value: ConstantValue::String(s.clone()),
            },
            ExportValue::Object(object) => match self.enter(value) {
                Visit::Repeat(target) => MockMetadata::Ref { target },
                Visit::First(id) => MockMetadata::Object {
                    id,
                    members: self.visit_members(object.entries()),
                },
            },
            ExportValue::Array(array) => match self.enter(value) {
                Visit::Repeat(target) => MockMetadata::Ref { target },
                Visit::First(id) => MockMetadata::Array {
                    id,
                    items: array.items().iter().map(|item| self.visit(item)).collect(),
                },
            },
            ExportValue::Function(function) => match self.enter(value) {
                Visit::Repeat(target) => MockMetadata::Ref { target },
                Visit::First(id) => MockMetadata::Function {
                    id,
                    name: function.name().to_string(),
                    members: self.visit_members(function.entries()),
                },
            },
        }
    }

    fn visit_members(
        &mut self,
        entries: Vec<(String, ExportValue)>,
    ) -> BTreeMap<String, MockMetadata> {
        entries
            .into_iter()
            .map(|(key, member)| {
                let shape = self.visit(&member);
                (key, shape)
            })
            .collect()
    }
}

#[derive(Default)]
struct MockSynthesizer {
    built: HashMap<u32, ExportValue>,
}

impl MockSynthesizer {
    fn build(&mut self, metadata: &MockMetadata) -> ExportValue {
        match metadata {
            MockMetadata::Undefined => ExportValue::Undefined,
            MockMetadata::Null => ExportValue::Null,
            MockMetadata::Constant { value } => ExportValue::from(value),
            MockMetadata::Object { id, members } => {
                let object = ExportValue::object();
                // Register before members so self-references resolve
                self.built.insert(*id, object.clone());
                self.fill_members(&object, members);
                object
            }
            MockMetadata::Array { id, items } => {
                let array = Rc::new(ArrayValue::default());
                let value = ExportValue::Array(Rc::clone(&array));
                self.built.insert(*id, value.clone());
                for item in items {
                    array.push(self.build(item));
                }
                value
            }
            MockMetadata::Function { id, name, members } => {
                let function = ExportValue::mock_function(name);
                self.built.insert(*id, function.clone());
                self.fill_members(&function, members);
                function
            }
            MockMetadata::Ref { target } => self.built.get(target).cloned().unwrap_or_default(),
        }
    }

    fn fill_members(&mut self, target: &ExportValue, members: &BTreeMap<String, MockMetadata>) {
        for (key, shape) in members {
            let member = self.build(shape);
            target.set(key.clone(), member);
        }
    }
}
