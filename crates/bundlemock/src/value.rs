//! Export Values
//!
//! The value a bundled module exports. Modules are dynamic, so exports are
//! too: primitives, plain objects, arrays and callable functions.
//!
//! Objects, arrays and functions are reference types. Cloning an
//! [`ExportValue`] clones the handle, not the data, so every module that
//! requires a singleton sees the same instance. Use [`ExportValue::same_ref`]
//! to check identity.
//!
//! Functions come in two flavours:
//!
//! - **native**: a Rust closure standing in for module code
//! - **mock**: an inert function that records its calls and returns
//!   `undefined` until told otherwise

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Body of a native (or mock implementation) function
pub type NativeFn = Rc<dyn Fn(&[ExportValue]) -> ExportValue>;

/// Named members of an object or function
pub type Members = BTreeMap<String, ExportValue>;

/// A module export value
#[derive(Clone, Default)]
pub enum ExportValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean constant
    Bool(bool),
    /// Number constant
    Number(f64),
    /// String constant
    String(String),
    /// Plain object (reference type)
    Object(Rc<ObjectValue>),
    /// Array (reference type)
    Array(Rc<ArrayValue>),
    /// Callable function (reference type)
    Function(Rc<FunctionValue>),
}

impl ExportValue {
    /// Create an empty object
    #[must_use]
    pub fn object() -> Self {
        Self::Object(Rc::new(ObjectValue::default()))
    }

    /// Create an object from `(name, value)` pairs
    #[must_use]
    pub fn object_with<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, ExportValue)>,
        K: Into<String>,
    {
        let object = ObjectValue::default();
        for (key, value) in members {
            object.set(key, value);
        }
        Self::Object(Rc::new(object))
    }

    /// Create an array
    #[must_use]
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ExportValue>,
    {
        Self::Array(Rc::new(ArrayValue {
            items: RefCell::new(items.into_iter().collect()),
        }))
    }

    /// Create a native function
    #[must_use]
    pub fn function<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[ExportValue]) -> ExportValue + 'static,
    {
        Self::Function(Rc::new(FunctionValue {
            name: name.to_string(),
            body: FunctionBody::Native(Rc::new(body)),
            members: RefCell::new(Members::new()),
        }))
    }

    /// Create an inert mock function
    #[must_use]
    pub fn mock_function(name: &str) -> Self {
        Self::Function(Rc::new(FunctionValue {
            name: name.to_string(),
            body: FunctionBody::Mock(MockState::default()),
            members: RefCell::new(Members::new()),
        }))
    }

    /// Create a string constant
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create a number constant
    #[must_use]
    pub const fn number(value: f64) -> Self {
        Self::Number(value)
    }

    /// Type name as a JavaScript-style `typeof`, with arrays split out
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Function(_) => "function",
        }
    }

    /// Strict equality: identity for reference types, value for primitives
    #[must_use]
    pub fn same_ref(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Address of the shared allocation for reference types
    pub(crate) fn ref_addr(&self) -> Option<usize> {
        match self {
            Self::Object(o) => Some(Rc::as_ptr(o).cast::<()>() as usize),
            Self::Array(a) => Some(Rc::as_ptr(a).cast::<()>() as usize),
            Self::Function(f) => Some(Rc::as_ptr(f).cast::<()>() as usize),
            _ => None,
        }
    }

    /// Read a member. Arrays accept decimal indices.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ExportValue> {
        match self {
            Self::Object(o) => o.get(key),
            Self::Function(f) => f.get(key),
            Self::Array(a) => key.parse::<usize>().ok().and_then(|i| a.get(i)),
            _ => None,
        }
    }

    /// Write a member on an object or function.
    ///
    /// Returns `false` when the value cannot hold members.
    pub fn set(&self, key: impl Into<String>, value: ExportValue) -> bool {
        match self {
            Self::Object(o) => {
                o.set(key, value);
                true
            }
            Self::Function(f) => {
                f.set(key, value);
                true
            }
            _ => false,
        }
    }

    /// Member names of an object or function, in sorted order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Object(o) => o.keys(),
            Self::Function(f) => f.keys(),
            _ => Vec::new(),
        }
    }

    /// Call the value if it is a function
    #[must_use]
    pub fn call(&self, args: &[ExportValue]) -> Option<ExportValue> {
        self.as_function().map(|f| f.call(args))
    }

    /// Borrow as a function
    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            Self::Function(f) => Some(f.as_ref()),
            _ => None,
        }
    }

    /// Borrow as an object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Borrow as an array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(a) => Some(a.as_ref()),
            _ => None,
        }
    }

    /// Borrow as a string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a number
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Read as a boolean
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check for `undefined`
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check whether this is a mock function
    #[must_use]
    pub fn is_mock_function(&self) -> bool {
        self.as_function().is_some_and(FunctionValue::is_mock)
    }
}

impl fmt::Debug for ExportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: export graphs may be cyclic
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Object(o) => f.debug_struct("Object").field("keys", &o.keys()).finish(),
            Self::Array(a) => f.debug_struct("Array").field("len", &a.len()).finish(),
            Self::Function(func) => f
                .debug_struct("Function")
                .field("name", &func.name)
                .field("mock", &func.is_mock())
                .finish(),
        }
    }
}

impl From<bool> for ExportValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ExportValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ExportValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ExportValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ExportValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Plain object storage
#[derive(Debug, Default)]
pub struct ObjectValue {
    members: RefCell<Members>,
}

impl ObjectValue {
    /// Read a member
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ExportValue> {
        self.members.borrow().get(key).cloned()
    }

    /// Write a member
    pub fn set(&self, key: impl Into<String>, value: ExportValue) {
        self.members.borrow_mut().insert(key.into(), value);
    }

    /// Member names
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    /// Snapshot of all members
    #[must_use]
    pub fn entries(&self) -> Vec<(String, ExportValue)> {
        self.members
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    /// Whether the object has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }
}

/// Array storage
#[derive(Debug, Default)]
pub struct ArrayValue {
    items: RefCell<Vec<ExportValue>>,
}

impl ArrayValue {
    /// Read an element
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ExportValue> {
        self.items.borrow().get(index).cloned()
    }

    /// Append an element
    pub fn push(&self, value: ExportValue) {
        self.items.borrow_mut().push(value);
    }

    /// Snapshot of all elements
    #[must_use]
    pub fn items(&self) -> Vec<ExportValue> {
        self.items.borrow().clone()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the array is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

enum FunctionBody {
    Native(NativeFn),
    Mock(MockState),
}

#[derive(Default)]
struct MockState {
    calls: RefCell<Vec<Vec<ExportValue>>>,
    return_value: RefCell<Option<ExportValue>>,
    implementation: RefCell<Option<NativeFn>>,
}

/// Function storage: a name, a body and static members
pub struct FunctionValue {
    name: String,
    body: FunctionBody,
    members: RefCell<Members>,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("mock", &self.is_mock())
            .field("call_count", &self.call_count())
            .field("members", &self.keys())
            .finish()
    }
}

impl FunctionValue {
    /// Function name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a mock function
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self.body, FunctionBody::Mock(_))
    }

    /// Invoke the function.
    ///
    /// Mock functions record `args` first, then run their implementation,
    /// then fall back to their configured return value (default `undefined`).
    pub fn call(&self, args: &[ExportValue]) -> ExportValue {
        match &self.body {
            FunctionBody::Native(body) => body(args),
            FunctionBody::Mock(state) => {
                state.calls.borrow_mut().push(args.to_vec());
                // Clone out so the implementation may reconfigure this mock
                let implementation = state.implementation.borrow().clone();
                if let Some(implementation) = implementation {
                    return implementation(args);
                }
                state.return_value.borrow().clone().unwrap_or_default()
            }
        }
    }

    /// Recorded call arguments (always empty for native functions)
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<ExportValue>> {
        match &self.body {
            FunctionBody::Native(_) => Vec::new(),
            FunctionBody::Mock(state) => state.calls.borrow().clone(),
        }
    }

    /// Number of recorded calls
    #[must_use]
    pub fn call_count(&self) -> usize {
        match &self.body {
            FunctionBody::Native(_) => 0,
            FunctionBody::Mock(state) => state.calls.borrow().len(),
        }
    }

    /// Make a mock return `value`. No-op on native functions.
    pub fn mock_return_value(&self, value: ExportValue) -> &Self {
        if let FunctionBody::Mock(state) = &self.body {
            *state.return_value.borrow_mut() = Some(value);
        }
        self
    }

    /// Give a mock a behaviour. No-op on native functions.
    pub fn mock_implementation<F>(&self, body: F) -> &Self
    where
        F: Fn(&[ExportValue]) -> ExportValue + 'static,
    {
        if let FunctionBody::Mock(state) = &self.body {
            *state.implementation.borrow_mut() = Some(Rc::new(body));
        }
        self
    }

    /// Forget recorded calls, keeping configured behaviour
    pub fn mock_clear(&self) -> &Self {
        if let FunctionBody::Mock(state) = &self.body {
            state.calls.borrow_mut().clear();
        }
        self
    }

    /// Read a static member
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ExportValue> {
        self.members.borrow().get(key).cloned()
    }

    /// Write a static member
    pub fn set(&self, key: impl Into<String>, value: ExportValue) {
        self.members.borrow_mut().insert(key.into(), value);
    }

    /// Static member names
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    /// Snapshot of static members
    #[must_use]
    pub fn entries(&self) -> Vec<(String, ExportValue)> {
        self.members
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
