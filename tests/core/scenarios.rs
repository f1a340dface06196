//! End-to-end scenarios: wrap, build a cycle, sanitize, serialize, print.

use crate::common::*;

fn scenario_error() -> AppError {
    wrap(
        std::io::Error::new(std::io::ErrorKind::Other, "Some error"),
        fields([
            ("extra1", Value::from("first")),
            ("extra2", Value::from("second")),
            ("extra3", Value::from("third")),
        ]),
    )
}

#[test]
fn wrap_native_error_with_extra() {
    init_tracing();
    let error = scenario_error();

    assert_eq!(error.message(), "Some error");
    assert_eq!(error.get("extra1"), Some(Value::from("first")));
    assert_eq!(error.get("extra2"), Some(Value::from("second")));
    assert_eq!(error.get("extra3"), Some(Value::from("third")));
}

#[test]
fn sanitize_cuts_cycle_through_extra() {
    init_tracing();
    let error = scenario_error();
    let deep = Value::object(fields([("error", Value::from(error.clone()))]));
    error.set("extra", Value::object(fields([("deep", deep)])));

    error.sanitize();

    assert_eq!(error.lookup("extra.deep.error"), Some(Value::from(CIRCULAR)));
    assert!(!has_cycle(&Value::from(error)));
}

#[test]
fn serialize_entity_with_cycle() {
    init_tracing();
    let error = scenario_error();
    let deep = Value::object(fields([("error", Value::from(error.clone()))]));
    error.set("extra", Value::object(fields([("deep", deep)])));

    let text = serde_json::to_string(&error).unwrap();

    assert!(text.contains("[Circular]"));
}

#[test]
fn print_entity_after_cycle() {
    init_tracing();
    let error = scenario_error();
    error.set("extra", Value::object(fields([("again", Value::from(error.clone()))])));

    let out = capture_report(&error, None);

    assert!(out.starts_with("Error: (code: Other) Some error\nBacktrace:      Error: Some error"));
    assert!(out.contains("\"again\": \"[Circular]\""));
}

#[test]
fn wrap_plain_message() {
    let error = wrap("plain message", Map::new());

    assert_eq!(error.message(), "plain message");
    assert_eq!(error.code(), None);
}

#[test]
fn wrap_null() {
    let error = wrap(Value::Null, Map::new());

    assert_eq!(error.message(), "Unknown error");
    assert_eq!(error.get("origin"), Some(Value::Null));
}

#[test]
fn back_edge_into_entity_is_cut() {
    let error = AppError::with_options("m", fixed("m"));
    let probe = Value::empty_object();
    probe.set("owner", error.clone());
    error.set("probe", probe.clone());

    error.sanitize();

    assert_eq!(probe.get("owner"), Some(Value::from(CIRCULAR)));
}
