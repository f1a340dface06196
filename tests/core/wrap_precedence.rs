//! Field precedence and identity rules of `wrap`.

use crate::common::*;
use app_error::{ErrorInput, NativeError, WrapErr};

#[test]
fn wrap_returns_same_entity() {
    let error = AppError::new("m");

    let wrapped = wrap(error.clone(), Map::new());

    assert!(wrapped.ptr_eq(&error));
    assert_eq!(wrapped.id(), error.id());
}

#[test]
fn repeated_wraps_accumulate_extra() {
    let error = AppError::new("m");

    wrap(&error, fields([("a", Value::Int(1))]));
    wrap(&error, fields([("a", Value::Int(2)), ("b", Value::Int(3))]));

    assert_eq!(error.get("a"), Some(Value::Int(1)));
    assert_eq!(error.get("b"), Some(Value::Int(3)));
}

#[test]
fn explicit_fields_beat_origin_and_extra() {
    let input = fields([
        ("message", Value::from("m")),
        ("code", Value::Int(1)),
        ("stack", Value::from("s")),
        ("x", Value::Int(1)),
    ]);

    let error = wrap(input, fields([("x", Value::Int(2)), ("y", Value::Int(3))]));

    assert_eq!(error.message(), "m");
    assert_eq!(error.code(), Some(ErrorCode::Int(1)));
    assert_eq!(error.stack(), "s");
    assert_eq!(error.get("x"), Some(Value::Int(1)));
    assert_eq!(error.get("y"), Some(Value::Int(3)));
}

#[test]
fn object_value_is_destructured() {
    let input = Value::object(fields([
        ("message", Value::from("from object")),
        ("detail", Value::from("d")),
    ]));

    let error = wrap(input, Map::new());

    assert_eq!(error.message(), "from object");
    assert_eq!(error.get("detail"), Some(Value::from("d")));
    assert_eq!(error.get("origin"), None);
}

#[test]
fn native_error_struct_input() {
    let native = NativeError {
        message: Some("native".to_string()),
        code: Some(ErrorCode::Int(500)),
        stack: Some("at somewhere".to_string()),
        origin: fields([("host", Value::from("db1"))]),
    };

    let error = wrap(native, fields([("host", Value::from("ignored")), ("attempt", Value::Int(2))]));

    assert_eq!(error.code(), Some(ErrorCode::Int(500)));
    assert_eq!(error.stack(), "at somewhere");
    assert_eq!(error.get("host"), Some(Value::from("db1")));
    assert_eq!(error.get("attempt"), Some(Value::Int(2)));
    let keys: Vec<String> = error.extra().keys().cloned().collect();
    assert_eq!(keys, vec!["host", "attempt"]);
}

#[test]
fn other_values_become_unknown_error() {
    for input in [Value::Int(3), Value::Bool(false), Value::Float(1.5), Value::Null] {
        let error = wrap(input.clone(), Map::new());
        assert_eq!(error.message(), "Unknown error");
        assert_eq!(error.get("origin"), Some(input));
    }
}

#[test]
fn string_with_message_option_uses_option() {
    let error = wrap("positional", fields([("message", Value::from("explicit"))]));

    assert_eq!(error.message(), "explicit");
}

#[test]
fn boxed_std_error_is_native() {
    let boxed: Box<dyn std::error::Error + Send + Sync> = "parse failed".into();

    let error = wrap(boxed, Map::new());

    assert_eq!(error.message(), "parse failed");
    assert_eq!(error.code(), None);
}

#[test]
fn question_mark_interop() {
    fn read_config() -> Result<String, AppError> {
        let text = std::fs::read_to_string("/definitely/not/here.toml")?;
        Ok(text)
    }

    let error = read_config().unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::Text("NotFound".to_string())));
    assert!(error.get("errno").is_some());
}

#[test]
fn wrap_err_on_results() {
    let result: Result<(), &str> = Err("bad input");

    let error = result
        .wrap_err_with(|| fields([("field", Value::from("name"))]))
        .unwrap_err();

    assert_eq!(error.message(), "bad input");
    assert_eq!(error.get("field"), Some(Value::from("name")));
    assert!(matches!(ErrorInput::from(error), ErrorInput::Canonical(_)));
}
