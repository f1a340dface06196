//! Report formatting and sink routing.

use crate::common::*;
use app_error::{render, report, report_warn, Severity, Sink, TracingSink};
use std::io;

#[test]
fn report_layout_is_exact() {
    let error = AppError::with_options(
        "disk full",
        ErrorOptions::new()
            .code("ENOSPC")
            .stack("Error: disk full\n    at write\n    at flush")
            .field("path", "/var/log")
            .field("free", 0),
    );

    let out = capture_report(&error, Some("Storage"));

    assert_eq!(
        out,
        "Storage: (code: ENOSPC) disk full\n\
         Backtrace:      Error: disk full\n\
         \x20        at write\n\
         \x20        at flush\n\
         {\n   \"path\": \"/var/log\",\n   \"free\": 0\n}"
    );
}

#[test]
fn report_without_extra() {
    let error = AppError::with_options("m", fixed("m"));

    assert_eq!(capture_report(&error, None), "Error: m\nBacktrace:      Error: m\n");
}

#[test]
fn falsy_codes_are_not_printed() {
    for code in [ErrorCode::Int(0), ErrorCode::Bool(false), ErrorCode::Text(String::new())] {
        let error = AppError::with_options("m", fixed("m"));
        error.set_code(Some(code));
        assert!(capture_report(&error, None).starts_with("Error: m\n"));
    }
}

#[test]
fn truthy_bool_code_is_printed() {
    let error = AppError::with_options("m", fixed("m").code(true));

    assert!(capture_report(&error, None).starts_with("Error: (code: true) m\n"));
}

#[test]
fn render_matches_report() {
    let error = AppError::with_options("m", fixed("m").field("k", "v"));

    assert_eq!(render(&error, "Error").unwrap(), capture_report(&error, None));
}

#[test]
fn option_prefix_beats_positional() {
    let error = AppError::with_options("m", fixed("m"));
    let mut out = String::new();

    report_warn(
        &error,
        Some("Positional"),
        PrintOptions::new()
            .prefix("Warning")
            .sink(|s: &str| -> io::Result<()> {
                out.push_str(s);
                Ok(())
            }),
    )
    .unwrap();

    assert!(out.starts_with("Warning: m\n"));
}

#[test]
fn sink_failure_is_returned() {
    let error = AppError::with_options("m", fixed("m"));

    let result = error.print(PrintOptions::new().sink(|_: &str| -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::WriteZero, "full"))
    }));

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::WriteZero);
}

#[test]
fn tracing_sink_accepts_reports() {
    init_tracing();
    let error = AppError::with_options("m", fixed("m").code(1));

    assert!(error.print(PrintOptions::from("Traced").sink(TracingSink)).is_ok());
    assert!(error.print_warn(PrintOptions::new().sink(TracingSink)).is_ok());
}

#[test]
fn report_marks_functions_and_cycles() {
    let error = AppError::with_options("m", fixed("m"));
    let ctx = Value::empty_object();
    ctx.set("retry", noop("retry"));
    ctx.set("owner", error.clone());
    error.set("ctx", ctx);

    let out = capture_report(&error, None);

    assert!(out.contains("\"retry\": \"[Function]\""));
    assert!(out.contains("\"owner\": \"[Circular]\""));
}

struct SeverityLog<'a>(&'a mut Vec<Severity>);

impl Sink for SeverityLog<'_> {
    fn emit(&mut self, severity: Severity, _report: &str) -> io::Result<()> {
        self.0.push(severity);
        Ok(())
    }
}

#[test]
fn print_and_print_warn_report_their_severity() {
    let error = AppError::with_options("m", fixed("m"));
    let mut seen = Vec::new();

    error.print(PrintOptions::new().sink(SeverityLog(&mut seen))).unwrap();
    error.print_warn(PrintOptions::new().sink(SeverityLog(&mut seen))).unwrap();
    report(&error, Some("P"), PrintOptions::new().sink(SeverityLog(&mut seen))).unwrap();

    assert_eq!(seen, vec![Severity::Error, Severity::Warn, Severity::Error]);
}
