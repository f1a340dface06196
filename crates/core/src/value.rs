//! Value types for app-error
//!
//! This module defines the dynamic value graph that diagnostic fields live in:
//! - Value: scalars, shared containers, callables and embedded errors
//! - Node: a shared, lockable container handle with a stable identity
//! - Function: a named callable stored inside the graph
//!
//! ## Reference Semantics
//!
//! Arrays and objects are stored behind [`Node`] handles. Cloning a `Value`
//! clones the handle, so two fields can point at the same container and a
//! container can (directly or transitively) contain itself. The sanitizer in
//! [`crate::sanitize`] is what makes such graphs safe to serialize.
//!
//! ## Truthiness
//!
//! `Null`, `false`, `0`, `0.0`, `NaN` and `""` are falsy. Everything else,
//! including empty containers, is truthy.

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::entity::AppError;
use crate::path::FieldPath;
use crate::sanitize::CIRCULAR_ERROR;

/// Ordered map of field names to values
pub type Map = IndexMap<String, Value>;

/// Identity of a shared container, stable for the lifetime of the allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Shared handle to a lockable container
///
/// Clones share the same allocation; [`Node::ptr_eq`] and [`Node::id`]
/// compare identity, not contents.
pub struct Node<T>(Arc<RwLock<T>>);

impl<T> Node<T> {
    /// Allocate a new node
    pub fn new(inner: T) -> Self {
        Node(Arc::new(RwLock::new(inner)))
    }

    /// Identity of this node
    pub fn id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Check whether two handles point at the same node
    pub fn ptr_eq(&self, other: &Node<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Shared access, blocking while a writer holds the node
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read_recursive()
    }

    /// Exclusive access, blocking while any guard is held
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    pub(crate) fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.0.try_read_recursive()
    }

    pub(crate) fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.0.try_write()
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:#x})", self.id().0)
    }
}

/// A named callable stored in a value graph
///
/// Functions never survive sanitization inside a container: they are
/// replaced by the `"[Function]"` marker.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

impl Function {
    /// Wrap a closure under a display name
    pub fn new<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Function {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    /// Display name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callable
    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }

    /// Check whether two handles share the same callable
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// A value that can appear in an error's diagnostic fields
#[derive(Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Shared array
    Array(Node<Vec<Value>>),
    /// Shared object with insertion-ordered keys
    Object(Node<Map>),
    /// Callable value
    Function(Function),
    /// Embedded canonical error; its entries are its extra fields
    Error(AppError),
}

impl Value {
    /// Allocate a new shared array
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Node::new(items))
    }

    /// Allocate a new shared object
    pub fn object(fields: Map) -> Self {
        Value::Object(Node::new(fields))
    }

    /// Allocate a new empty shared object
    pub fn empty_object() -> Self {
        Value::object(Map::new())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
            Value::Function(_) => "Function",
            Value::Error(_) => "Error",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value has entries the sanitizer walks into
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Error(_))
    }

    /// Check if this is a callable value
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Truthiness as used for message fallback and code display
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Identity of the underlying container, if this is one
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Array(node) => Some(node.id()),
            Value::Object(node) => Some(node.id()),
            Value::Error(error) => Some(error.id()),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the embedded error if this is an Error value
    pub fn as_error(&self) -> Option<&AppError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Read a field of an object or error entity
    ///
    /// For errors, `code`, `message` and `stack` resolve to the typed
    /// fields; every other key resolves against the extra fields.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(node) => node.read().get(key).cloned(),
            Value::Error(error) => error.get(key),
            _ => None,
        }
    }

    /// Read an element of an array
    pub fn at(&self, idx: usize) -> Option<Value> {
        match self {
            Value::Array(node) => node.read().get(idx).cloned(),
            _ => None,
        }
    }

    /// Set a field on an object or error entity
    ///
    /// Returns `false` if this value has no fields.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(node) => {
                node.write().insert(key.into(), value.into());
                true
            }
            Value::Error(error) => {
                error.set(key, value);
                true
            }
            _ => false,
        }
    }

    /// Append an element to an array
    ///
    /// Returns `false` if this value is not an array.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match self {
            Value::Array(node) => {
                node.write().push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Resolve a dotted path such as `extra.deep.error`
    ///
    /// An unparsable path resolves to `None`.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        path.parse::<FieldPath>().ok()?.resolve(self)
    }

    /// Convert to a `serde_json::Value`
    ///
    /// Functions become `"[Function]"`, errors become their plain record and
    /// non-finite floats become `null`. The graph is expected to be
    /// sanitized; nesting past the configured depth limit, or a node that
    /// cannot be read, is rendered as `"[CircularError]"`.
    pub fn to_json(&self) -> serde_json::Value {
        self.json_at(0, crate::config::current().max_depth)
    }

    pub(crate) fn json_at(&self, depth: usize, limit: usize) -> serde_json::Value {
        use serde_json::Value as Json;

        if self.is_container() && depth > limit {
            return Json::String(CIRCULAR_ERROR.to_string());
        }
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(node) => match node.try_read() {
                Some(items) => Json::Array(
                    items
                        .iter()
                        .map(|item| item.json_at(depth + 1, limit))
                        .collect(),
                ),
                None => Json::String(CIRCULAR_ERROR.to_string()),
            },
            Value::Object(node) => match node.try_read() {
                Some(fields) => Json::Object(
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.json_at(depth + 1, limit)))
                        .collect(),
                ),
                None => Json::String(CIRCULAR_ERROR.to_string()),
            },
            Value::Function(_) => Json::String(crate::sanitize::FUNCTION.to_string()),
            Value::Error(error) => crate::serialize::plain_record_at(error, depth, limit),
        }
    }
}

// Containers and callables compare by identity first; distinct containers
// compare structurally. A pair of containers met again during one comparison
// is assumed equal, so cyclic graphs compare without unbounded descent.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self.clone(), other.clone())];
        let mut assumed: HashSet<(NodeId, NodeId)> = HashSet::new();

        while let Some((a, b)) = pending.pop() {
            match (&a, &b) {
                (Value::Array(x), Value::Array(y)) => {
                    if x.ptr_eq(y) || !assumed.insert((x.id(), y.id())) {
                        continue;
                    }
                    let (xs, ys) = (x.read().clone(), y.read().clone());
                    if xs.len() != ys.len() {
                        return false;
                    }
                    pending.extend(xs.into_iter().zip(ys));
                }
                (Value::Object(x), Value::Object(y)) => {
                    if x.ptr_eq(y) || !assumed.insert((x.id(), y.id())) {
                        continue;
                    }
                    let (xs, ys) = (x.read().clone(), y.read().clone());
                    if xs.len() != ys.len() {
                        return false;
                    }
                    for (key, v) in xs {
                        match ys.get(&key) {
                            Some(w) => pending.push((v, w.clone())),
                            None => return false,
                        }
                    }
                }
                _ => {
                    if !leaf_eq(&a, &b) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn leaf_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        (Value::Error(a), Value::Error(b)) => a.ptr_eq(b),
        _ => false,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Function(func) => func.fmt(f),
            container => f
                .debug_tuple(container.type_name())
                .field(&container.to_json())
                .finish(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Map> for Value {
    fn from(fields: Map) -> Self {
        Value::object(fields)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<AppError> for Value {
    fn from(e: AppError) -> Self {
        Value::Error(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            Json::Object(fields) => {
                Value::object(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Build a [`Map`] from key/value pairs
pub fn fields<K, I>(entries: I) -> Map
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
