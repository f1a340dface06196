//! The canonical error entity
//!
//! [`AppError`] is a handle to one shared error record holding an optional
//! code, a message, a backtrace and an ordered set of extra diagnostic fields.
//! Cloning the handle does not copy the record; [`AppError::ptr_eq`] compares
//! identity.
//!
//! `code`, `message` and `stack` are typed fields. Keys with those names that
//! arrive through extra or origin data are consumed as options or dropped;
//! they never become extra fields.

use serde::Serialize;
use std::fmt;
use std::io;

use crate::config;
use crate::sanitize;
use crate::value::{Map, Node, NodeId, Value};

/// Field name of the classification code
pub const CODE: &str = "code";
/// Field name of the message
pub const MESSAGE: &str = "message";
/// Field name of the backtrace
pub const STACK: &str = "stack";

pub(crate) fn is_reserved(key: &str) -> bool {
    matches!(key, CODE | MESSAGE | STACK)
}

/// Scalar classification tag of an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Boolean code
    Bool(bool),
    /// Integer code, e.g. an HTTP status
    Int(i64),
    /// Floating point code
    Float(f64),
    /// Textual code, e.g. `"NotFound"`
    Text(String),
}

impl ErrorCode {
    /// Accept a scalar value as a code.
    ///
    /// `Null` and non-scalar values are not codes.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(ErrorCode::Bool(*b)),
            Value::Int(i) => Some(ErrorCode::Int(*i)),
            Value::Float(f) => Some(ErrorCode::Float(*f)),
            Value::String(s) => Some(ErrorCode::Text(s.clone())),
            _ => None,
        }
    }

    /// The code as a value
    pub fn to_value(&self) -> Value {
        match self {
            ErrorCode::Bool(b) => Value::Bool(*b),
            ErrorCode::Int(i) => Value::Int(*i),
            ErrorCode::Float(f) => Value::Float(*f),
            ErrorCode::Text(s) => Value::String(s.clone()),
        }
    }

    /// Whether the code is shown in reports
    pub fn is_truthy(&self) -> bool {
        self.to_value().is_truthy()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Bool(b) => write!(f, "{}", b),
            ErrorCode::Int(i) => write!(f, "{}", i),
            ErrorCode::Float(x) => write!(f, "{}", x),
            ErrorCode::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(i: i64) -> Self {
        ErrorCode::Int(i)
    }
}

impl From<i32> for ErrorCode {
    fn from(i: i32) -> Self {
        ErrorCode::Int(i as i64)
    }
}

impl From<u16> for ErrorCode {
    fn from(i: u16) -> Self {
        ErrorCode::Int(i as i64)
    }
}

impl From<bool> for ErrorCode {
    fn from(b: bool) -> Self {
        ErrorCode::Bool(b)
    }
}

impl From<f64> for ErrorCode {
    fn from(f: f64) -> Self {
        ErrorCode::Float(f)
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::Text(s.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        ErrorCode::Text(s)
    }
}

/// Options for direct construction
#[derive(Debug, Clone, Default)]
pub struct ErrorOptions {
    /// Classification code
    pub code: Option<ErrorCode>,
    /// Overrides the positional message when non-empty
    pub message: Option<String>,
    /// Overrides the captured backtrace
    pub stack: Option<String>,
    /// Extra diagnostic fields, in order
    pub extra: Map,
}

impl ErrorOptions {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Destructure `code`, `message` and `stack` out of a field map.
    ///
    /// A truthy scalar `message` becomes the message text, a scalar `code`
    /// becomes the code and a string `stack` becomes the stack. Reserved keys
    /// with any other value are dropped. Remaining keys keep their order.
    pub fn from_map(map: Map) -> Self {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                CODE => options.code = ErrorCode::from_value(&value),
                MESSAGE => options.message = message_text(&value),
                STACK => options.stack = value.as_str().map(str::to_string),
                _ => {
                    options.extra.insert(key, value);
                }
            }
        }
        options
    }

    /// Set the code
    pub fn code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the stack
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Add an extra field; reserved names set the typed option instead
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            CODE => self.code = ErrorCode::from_value(&value),
            MESSAGE => self.message = message_text(&value),
            STACK => self.stack = value.as_str().map(str::to_string),
            _ => {
                self.extra.insert(key, value);
            }
        }
        self
    }
}

fn message_text(value: &Value) -> Option<String> {
    if !value.is_truthy() {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

#[derive(Debug)]
pub(crate) struct ErrorRecord {
    pub(crate) code: Option<ErrorCode>,
    pub(crate) message: String,
    pub(crate) stack: String,
    pub(crate) extra: Map,
}

/// The canonical error entity
///
/// # Examples
///
/// ```
/// use app_error_core::{AppError, ErrorOptions};
///
/// let err = AppError::with_options(
///     "request failed",
///     ErrorOptions::new().code(503).field("attempt", 3),
/// );
/// assert_eq!(err.message(), "request failed");
/// assert_eq!(err.get("attempt").and_then(|v| v.as_int()), Some(3));
/// ```
#[derive(Clone)]
pub struct AppError {
    record: Node<ErrorRecord>,
}

impl AppError {
    /// Create an error with a message and a captured backtrace
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_options(message, ErrorOptions::default())
    }

    /// Create an error from a fallback message and options.
    ///
    /// A non-empty `options.message` wins over `fallback`; an explicit
    /// `options.stack` wins over the captured backtrace. The new error is
    /// sanitized before it is returned.
    pub fn with_options(fallback: impl Into<String>, options: ErrorOptions) -> Self {
        let ErrorOptions {
            code,
            message,
            stack,
            extra,
        } = options;
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.into());
        let stack = stack.unwrap_or_else(|| config::capture_stack(&message));
        let error = AppError {
            record: Node::new(ErrorRecord {
                code,
                message,
                stack,
                extra: extra.into_iter().filter(|(k, _)| !is_reserved(k)).collect(),
            }),
        };
        error.sanitize();
        error
    }

    pub(crate) fn record(&self) -> &Node<ErrorRecord> {
        &self.record
    }

    /// Identity of this entity
    pub fn id(&self) -> NodeId {
        self.record.id()
    }

    /// Check whether two handles refer to the same entity
    pub fn ptr_eq(&self, other: &AppError) -> bool {
        self.record.ptr_eq(&other.record)
    }

    /// Classification code, if any
    pub fn code(&self) -> Option<ErrorCode> {
        self.record.read().code.clone()
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        self.record.read().message.clone()
    }

    /// Backtrace text
    pub fn stack(&self) -> String {
        self.record.read().stack.clone()
    }

    /// Snapshot of the extra fields; containers are shared handles
    pub fn extra(&self) -> Map {
        self.record.read().extra.clone()
    }

    /// Read a field the way property access would.
    ///
    /// `code`, `message` and `stack` resolve to the typed fields, anything
    /// else to the extra fields.
    pub fn get(&self, key: &str) -> Option<Value> {
        let record = self.record.read();
        match key {
            CODE => record.code.as_ref().map(ErrorCode::to_value),
            MESSAGE => Some(Value::String(record.message.clone())),
            STACK => Some(Value::String(record.stack.clone())),
            _ => record.extra.get(key).cloned(),
        }
    }

    /// Resolve a dotted path such as `extra.deep.error` from this entity
    pub fn lookup(&self, path: &str) -> Option<Value> {
        Value::Error(self.clone()).lookup(path)
    }

    /// Assign a field the way property assignment would.
    ///
    /// `code` accepts scalars (anything else clears it), `message` and
    /// `stack` accept strings; other keys go to the extra fields. The entity
    /// is not sanitized; call [`AppError::sanitize`] after building cycles.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut record = self.record.write();
        match key.as_str() {
            CODE => record.code = ErrorCode::from_value(&value),
            MESSAGE => {
                if let Value::String(s) = value {
                    record.message = s;
                }
            }
            STACK => {
                if let Value::String(s) = value {
                    record.stack = s;
                }
            }
            _ => {
                record.extra.insert(key, value);
            }
        }
    }

    /// Set or clear the code
    pub fn set_code(&self, code: Option<ErrorCode>) {
        self.record.write().code = code;
    }

    /// Remove an extra field
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.record.write().extra.shift_remove(key)
    }

    /// Sanitize this entity in place.
    ///
    /// Idempotent. Returns `self` for chaining.
    pub fn sanitize(&self) -> &Self {
        sanitize::sanitize(&Value::Error(self.clone()));
        self
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(record) = self.record.try_read() else {
            return f.debug_struct("AppError").finish_non_exhaustive();
        };
        let limit = config::current().max_depth;
        let extra: serde_json::Map<String, serde_json::Value> = record
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.json_at(1, limit)))
            .collect();
        f.debug_struct("AppError")
            .field("code", &record.code)
            .field("message", &record.message)
            .field("extra", &extra)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.read();
        match &record.code {
            Some(code) if code.is_truthy() => write!(f, "(code: {}) {}", code, record.message),
            _ => write!(f, "{}", record.message),
        }
    }
}

impl std::error::Error for AppError {}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        crate::wrap::wrap(e, Map::new())
    }
}

impl From<&str> for AppError {
    fn from(message: &str) -> Self {
        AppError::new(message)
    }
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        AppError::new(message)
    }
}
