//! Human-readable error reports
//!
//! A report looks like:
//!
//! ```text
//! Error: (code: 404) not found
//! Backtrace:      Error: not found
//!          at handler
//! {
//!    "path": "/x"
//! }
//! ```
//!
//! The code part only appears when the code is truthy, every stack line is
//! indented by five spaces, and the extra fields are rendered as JSON with a
//! three-space indent (or omitted entirely when there are none).
//!
//! Reports are handed to a [`Sink`] together with their [`Severity`]:
//! [`report`] emits at [`Severity::Error`], [`report_warn`] at
//! [`Severity::Warn`]. Both default to [`Stderr`]. Sink failures are
//! returned to the caller untouched.

use serde::Serialize;
use std::io::{self, Write};

use crate::config;
use crate::entity::AppError;

/// Prefix used when none is given
pub const DEFAULT_PREFIX: &str = "Error";

const STACK_INDENT: &str = "     ";
const EXTRA_INDENT: &[u8] = b"   ";

/// Which entry point produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// From [`report`] / [`AppError::print`]
    Error,
    /// From [`report_warn`] / [`AppError::print_warn`]
    Warn,
}

/// Destination for a formatted report
pub trait Sink {
    /// Deliver one report
    fn emit(&mut self, severity: Severity, report: &str) -> io::Result<()>;
}

/// Closures receive the report text only.
impl<F> Sink for F
where
    F: FnMut(&str) -> io::Result<()>,
{
    fn emit(&mut self, _severity: Severity, report: &str) -> io::Result<()> {
        self(report)
    }
}

/// Writes reports of either severity to standard error
#[derive(Debug, Default, Clone, Copy)]
pub struct Stderr;

impl Sink for Stderr {
    fn emit(&mut self, _severity: Severity, report: &str) -> io::Result<()> {
        let mut out = io::stderr().lock();
        writeln!(out, "{}", report)
    }
}

/// Emits reports as `tracing` events at the level matching their severity
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&mut self, severity: Severity, report: &str) -> io::Result<()> {
        match severity {
            Severity::Error => tracing::error!("{}", report),
            Severity::Warn => tracing::warn!("{}", report),
        }
        Ok(())
    }
}

/// Options for [`report`]
#[derive(Default)]
pub struct PrintOptions<'a> {
    prefix: Option<String>,
    sink: Option<Box<dyn Sink + 'a>>,
}

impl<'a> PrintOptions<'a> {
    /// Default prefix and sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Label placed before the message; wins over a positional prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Where the report goes
    pub fn sink(mut self, sink: impl Sink + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

impl From<&str> for PrintOptions<'_> {
    fn from(prefix: &str) -> Self {
        PrintOptions::new().prefix(prefix)
    }
}

impl From<String> for PrintOptions<'_> {
    fn from(prefix: String) -> Self {
        PrintOptions::new().prefix(prefix)
    }
}

/// Format `error` as a report and hand it to the sink at error severity.
///
/// The prefix is `options.prefix`, else `prefix`, else `"Error"`. The sink
/// defaults to [`Stderr`]. The error is sanitized before formatting.
pub fn report(error: &AppError, prefix: Option<&str>, options: PrintOptions<'_>) -> io::Result<()> {
    dispatch(error, prefix, options, Severity::Error)
}

/// Same as [`report`], at warn severity.
pub fn report_warn(
    error: &AppError,
    prefix: Option<&str>,
    options: PrintOptions<'_>,
) -> io::Result<()> {
    dispatch(error, prefix, options, Severity::Warn)
}

fn dispatch(
    error: &AppError,
    prefix: Option<&str>,
    options: PrintOptions<'_>,
    severity: Severity,
) -> io::Result<()> {
    let PrintOptions {
        prefix: option_prefix,
        sink,
    } = options;
    let prefix = option_prefix
        .as_deref()
        .or(prefix)
        .unwrap_or(DEFAULT_PREFIX);
    let text = render(error, prefix)?;
    match sink {
        Some(mut sink) => sink.emit(severity, &text),
        None => Stderr.emit(severity, &text),
    }
}

/// Format `error` as a report without sending it anywhere.
pub fn render(error: &AppError, prefix: &str) -> io::Result<String> {
    error.sanitize();
    let limit = config::current().max_depth;
    let (head, stack, extra) = {
        let record = error.record().read();
        let code = match &record.code {
            Some(code) if code.is_truthy() => format!("(code: {}) ", code),
            _ => String::new(),
        };
        let extra: serde_json::Map<String, serde_json::Value> = record
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.json_at(1, limit)))
            .collect();
        (
            format!("{}: {}{}", prefix, code, record.message),
            indent_lines(&record.stack, STACK_INDENT),
            extra,
        )
    };

    let extra = if extra.is_empty() {
        String::new()
    } else {
        pretty(&serde_json::Value::Object(extra), EXTRA_INDENT)?
    };
    Ok(format!("{}\nBacktrace: {}\n{}", head, stack, extra))
}

fn indent_lines(text: &str, indent: &str) -> String {
    text.split('\n')
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty(value: &serde_json::Value, indent: &[u8]) -> io::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

impl AppError {
    /// Print a report; a `&str` converts into options carrying that prefix
    pub fn print<'a>(&self, options: impl Into<PrintOptions<'a>>) -> io::Result<()> {
        report(self, None, options.into())
    }

    /// Print a report at warn severity
    pub fn print_warn<'a>(&self, options: impl Into<PrintOptions<'a>>) -> io::Result<()> {
        report_warn(self, None, options.into())
    }
}
