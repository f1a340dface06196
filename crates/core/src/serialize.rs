//! Plain-record and text serialization
//!
//! The plain record of an error is a JSON object with the keys `code`,
//! `message`, `stack`, then every extra field in insertion order. `code` is
//! omitted when the error has none. The record is always built from a
//! sanitized entity, so it never contains a cycle.
//!
//! `Serialize` for [`AppError`] produces exactly this record, so ad-hoc
//! serialization anywhere (`serde_json::to_string(&err)`) has the same shape
//! as [`to_plain`].

use serde::{Serialize, Serializer};

use crate::config;
use crate::entity::{is_reserved, AppError, CODE, MESSAGE, STACK};
use crate::sanitize::{sanitize, CIRCULAR_ERROR};
use crate::value::{Map, Value};
use crate::wrap::{wrap, ORIGIN, UNKNOWN_ERROR};

/// Sanitize `error` and return its plain record.
///
/// # Examples
///
/// ```
/// use app_error_core::{to_plain, AppError, ErrorOptions};
///
/// let err = AppError::with_options("m", ErrorOptions::new().stack("s").field("x", 1));
/// assert_eq!(
///     to_plain(&err),
///     serde_json::json!({"message": "m", "stack": "s", "x": 1})
/// );
/// ```
pub fn to_plain(error: &AppError) -> serde_json::Value {
    error.sanitize();
    plain_record_at(error, 0, config::current().max_depth)
}

/// Plain record of a value that may not be an error yet.
///
/// - a falsy value gives `{"message": "Unknown error", "origin": null}`;
/// - an error gives its own record, as [`to_plain`];
/// - an object is sanitized in place and rendered with whichever of
///   `code`, `message` and `stack` it has moved to the front, in that order;
/// - anything else is normalized with [`wrap`] first.
///
/// # Examples
///
/// ```
/// use app_error_core::{serialize::to_plain_value, Value};
///
/// assert_eq!(
///     to_plain_value(&Value::Null).to_string(),
///     r#"{"message":"Unknown error","origin":null}"#
/// );
/// ```
pub fn to_plain_value(value: &Value) -> serde_json::Value {
    if !value.is_truthy() {
        let mut out = serde_json::Map::new();
        out.insert(MESSAGE.to_string(), UNKNOWN_ERROR.into());
        out.insert(ORIGIN.to_string(), serde_json::Value::Null);
        return serde_json::Value::Object(out);
    }
    match value {
        Value::Error(error) => to_plain(error),
        Value::Object(_) => match sanitize(value).to_json() {
            serde_json::Value::Object(fields) => {
                let mut out = serde_json::Map::new();
                for key in [CODE, MESSAGE, STACK] {
                    if let Some(v) = fields.get(key) {
                        out.insert(key.to_string(), v.clone());
                    }
                }
                out.extend(fields.into_iter().filter(|(k, _)| !is_reserved(k)));
                serde_json::Value::Object(out)
            }
            other => other,
        },
        other => to_plain(&wrap(other.clone(), Map::new())),
    }
}

/// Sanitize `error` and render its plain record with two-space indentation.
pub fn to_text(error: &AppError) -> String {
    format!("{:#}", to_plain(error))
}

pub(crate) fn plain_record_at(error: &AppError, depth: usize, limit: usize) -> serde_json::Value {
    let Some(record) = error.record().try_read() else {
        return serde_json::Value::String(CIRCULAR_ERROR.to_string());
    };
    let mut out = serde_json::Map::new();
    if let Some(code) = &record.code {
        out.insert(CODE.to_string(), code.to_value().json_at(depth + 1, limit));
    }
    out.insert(MESSAGE.to_string(), record.message.clone().into());
    out.insert(STACK.to_string(), record.stack.clone().into());
    for (key, value) in &record.extra {
        out.insert(key.clone(), value.json_at(depth + 1, limit));
    }
    serde_json::Value::Object(out)
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_plain(self).serialize(serializer)
    }
}

/// Serializes the sanitized graph; the root is sanitized in place first.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        sanitize(self).to_json().serialize(serializer)
    }
}

impl AppError {
    /// See [`to_plain`]
    pub fn to_plain(&self) -> serde_json::Value {
        to_plain(self)
    }

    /// See [`to_text`]
    pub fn to_text(&self) -> String {
        to_text(self)
    }
}
