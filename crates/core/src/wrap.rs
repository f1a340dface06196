//! Normalization of arbitrary failures into [`AppError`]
//!
//! [`wrap`] accepts anything convertible into an [`ErrorInput`] and always
//! produces a sanitized [`AppError`]; it never fails.
//!
//! # Precedence
//!
//! | Input | Result |
//! |-------|--------|
//! | `Canonical(e)` | `e` itself; new `extra` keys appended, existing fields win |
//! | `Native { .. }` | new error: `extra`, then `origin` over it, then explicit `code`/`message`/`stack` |
//! | `Message(s)` | new error with message `s`; `extra` treated as construction options |
//! | `Other(v)` | new error `"Unknown error"`; `extra` as options plus `origin: v` |

use std::error::Error as StdError;
use std::io;
use tracing::trace;

use crate::entity::{is_reserved, AppError, ErrorCode, ErrorOptions};
use crate::value::{Map, Value};

/// Message given to errors built from unrecognized input
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Field under which unrecognized input is recorded
pub const ORIGIN: &str = "origin";

/// A native error or plain object, destructured
#[derive(Debug, Clone, Default)]
pub struct NativeError {
    /// Message, if the input had one
    pub message: Option<String>,
    /// Code, if the input had a scalar one
    pub code: Option<ErrorCode>,
    /// Stack, if the input carried one
    pub stack: Option<String>,
    /// All remaining fields of the input
    pub origin: Map,
}

impl NativeError {
    /// Destructure a plain object into its reserved fields and the rest
    pub fn from_map(map: Map) -> Self {
        let ErrorOptions {
            code,
            message,
            stack,
            extra,
        } = ErrorOptions::from_map(map);
        NativeError {
            message,
            code,
            stack,
            origin: extra,
        }
    }

    /// Destructure a `std::error::Error`.
    ///
    /// The message is the error's `Display` output. Messages of the source
    /// chain, if any, are kept in a `causes` field.
    pub fn from_std(err: &(dyn StdError + 'static)) -> Self {
        let mut origin = Map::new();
        let causes: Vec<Value> = std::iter::successors(err.source(), |&e| e.source())
            .map(|e| Value::from(e.to_string()))
            .collect();
        if !causes.is_empty() {
            origin.insert("causes".to_string(), Value::array(causes));
        }
        NativeError {
            message: Some(err.to_string()),
            code: None,
            stack: None,
            origin,
        }
    }
}

/// Input accepted by [`wrap`]
#[derive(Debug, Clone)]
pub enum ErrorInput {
    /// An existing canonical error; wrapped in place
    Canonical(AppError),
    /// A native error or plain key/value object
    Native(NativeError),
    /// A bare message
    Message(String),
    /// Anything else, including `Null`
    Other(Value),
}

impl ErrorInput {
    /// Adapt any `std::error::Error`
    pub fn native(err: &(dyn StdError + 'static)) -> Self {
        ErrorInput::Native(NativeError::from_std(err))
    }
}

impl From<AppError> for ErrorInput {
    fn from(e: AppError) -> Self {
        ErrorInput::Canonical(e)
    }
}

impl From<&AppError> for ErrorInput {
    fn from(e: &AppError) -> Self {
        ErrorInput::Canonical(e.clone())
    }
}

impl From<&str> for ErrorInput {
    fn from(s: &str) -> Self {
        ErrorInput::Message(s.to_string())
    }
}

impl From<String> for ErrorInput {
    fn from(s: String) -> Self {
        ErrorInput::Message(s)
    }
}

impl From<NativeError> for ErrorInput {
    fn from(native: NativeError) -> Self {
        ErrorInput::Native(native)
    }
}

impl From<Map> for ErrorInput {
    fn from(map: Map) -> Self {
        ErrorInput::Native(NativeError::from_map(map))
    }
}

impl From<Value> for ErrorInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Error(e) => ErrorInput::Canonical(e),
            Value::String(s) => ErrorInput::Message(s),
            Value::Object(node) => {
                let map = node.read().clone();
                ErrorInput::Native(NativeError::from_map(map))
            }
            other => ErrorInput::Other(other),
        }
    }
}

impl From<io::Error> for ErrorInput {
    fn from(err: io::Error) -> Self {
        let mut native = NativeError::from_std(&err);
        native.code = Some(ErrorCode::Text(format!("{:?}", err.kind())));
        if let Some(errno) = err.raw_os_error() {
            native.origin.insert("errno".to_string(), Value::from(errno));
        }
        ErrorInput::Native(native)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for ErrorInput {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => ErrorInput::Canonical(*app),
            Err(other) => ErrorInput::native(&*other),
        }
    }
}

/// Normalize `input` into a sanitized [`AppError`], merging `extra`.
///
/// # Examples
///
/// ```
/// use app_error_core::{fields, wrap, Value};
///
/// let err = wrap("disk full", fields([("device", Value::from("sda"))]));
/// assert_eq!(err.message(), "disk full");
/// assert_eq!(err.get("device"), Some(Value::from("sda")));
///
/// // Wrapping a canonical error returns the same entity
/// let again = wrap(err.clone(), fields([("retry", Value::Bool(false))]));
/// assert!(again.ptr_eq(&err));
/// ```
pub fn wrap(input: impl Into<ErrorInput>, extra: Map) -> AppError {
    match input.into() {
        ErrorInput::Canonical(error) => {
            trace!(id = ?error.id(), "wrapping canonical error in place");
            {
                let mut record = error.record().write();
                for (key, value) in extra {
                    if is_reserved(&key) {
                        continue;
                    }
                    record.extra.entry(key).or_insert(value);
                }
            }
            error.sanitize();
            error
        }
        ErrorInput::Native(NativeError {
            message,
            code,
            stack,
            origin,
        }) => {
            let mut fields: Map = extra.into_iter().filter(|(k, _)| !is_reserved(k)).collect();
            for (key, value) in origin {
                if !is_reserved(&key) {
                    fields.insert(key, value);
                }
            }
            AppError::with_options(
                message.clone().unwrap_or_default(),
                ErrorOptions {
                    code,
                    message,
                    stack,
                    extra: fields,
                },
            )
        }
        ErrorInput::Message(message) => AppError::with_options(message, ErrorOptions::from_map(extra)),
        ErrorInput::Other(value) => {
            let mut options = ErrorOptions::from_map(extra);
            options.extra.insert(ORIGIN.to_string(), value);
            AppError::with_options(UNKNOWN_ERROR, options)
        }
    }
}

/// Extension for converting results into `Result<T, AppError>`
pub trait WrapErr<T> {
    /// Wrap the error without extra fields
    fn wrap_err(self) -> Result<T, AppError>;

    /// Wrap the error, merging lazily built extra fields
    fn wrap_err_with<F>(self, extra: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Map;
}

impl<T, E> WrapErr<T> for Result<T, E>
where
    E: Into<ErrorInput>,
{
    fn wrap_err(self) -> Result<T, AppError> {
        self.map_err(|e| wrap(e, Map::new()))
    }

    fn wrap_err_with<F>(self, extra: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Map,
    {
        self.map_err(|e| wrap(e, extra()))
    }
}
