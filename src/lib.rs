//! app-error - one canonical, serializable error entity for anything that fails
//!
//! Any failure value (a `std::error::Error`, an `io::Error`, a plain key/value
//! object, a string, or anything else) is normalized by [`wrap`] into an
//! [`AppError`] carrying an optional code, a message, a backtrace and an open
//! set of diagnostic fields. The entity is sanitized on every entry point, so
//! it can be serialized and printed even when its fields reference each other
//! in cycles.
//!
//! # Quick Start
//!
//! ```
//! use app_error::{fields, wrap, Value};
//!
//! // Optional, once at startup: always capture full backtraces
//! let _ = app_error::init();
//!
//! let err = wrap(
//!     std::io::Error::new(std::io::ErrorKind::NotFound, "config missing"),
//!     fields([("path", Value::from("/etc/app.toml"))]),
//! );
//!
//! let json = serde_json::to_string(&err).unwrap();
//! assert!(json.starts_with(r#"{"code":"NotFound","message":"config missing""#));
//! ```
//!
//! # Architecture
//!
//! All functionality lives in `app-error-core`; this crate re-exports it.

pub use app_error_core::*;
