//! Core types and operations for app-error
//!
//! This crate turns arbitrary failures into one canonical error entity and
//! makes that entity safe to serialize and print:
//! - Value: dynamic value graph with shared containers and identity
//! - FieldPath: dotted/indexed lookups into a value graph
//! - sanitize: in-place cycle and function removal with sentinel markers
//! - AppError: the canonical error entity (code, message, stack, extra)
//! - wrap: normalization of any input into an AppError
//! - to_plain / to_text: serialization, plus the `Serialize` hook
//! - report: human-readable reports dispatched to a sink
//! - config: one-time process-wide configuration
//! - Error: the library's own error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod entity;
pub mod error;
pub mod path;
pub mod print;
pub mod sanitize;
pub mod serialize;
pub mod value;
pub mod wrap;

pub use config::{init, init_with, BacktraceMode, Config};
pub use entity::{AppError, ErrorCode, ErrorOptions};
pub use error::{Error, Result};
pub use path::{FieldPath, PathParseError, PathSegment};
pub use print::{render, report, report_warn, PrintOptions, Severity, Sink, Stderr, TracingSink};
pub use sanitize::{sanitize, try_sanitize, SanitizeError, CIRCULAR, CIRCULAR_ERROR, FUNCTION};
pub use serialize::{to_plain, to_plain_value, to_text};
pub use value::{fields, Function, Map, Node, NodeId, Value};
pub use wrap::{wrap, ErrorInput, NativeError, WrapErr, UNKNOWN_ERROR};
