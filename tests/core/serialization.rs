//! Plain record shape and the automatic `Serialize` hook.

use crate::common::*;
use app_error::{to_plain, to_text};

#[test]
fn field_order_is_code_message_stack_then_extra() {
    let error = AppError::with_options(
        "m",
        fixed("m").field("b", 1).code("E_X").field("a", 2),
    );

    let text = serde_json::to_string(&error).unwrap();

    assert_eq!(
        text,
        r#"{"code":"E_X","message":"m","stack":"Error: m","b":1,"a":2}"#
    );
}

#[test]
fn hook_applies_to_nested_positions() {
    let error = AppError::with_options("m", fixed("m"));
    error.set("self", error.clone());

    let text = serde_json::to_string(&serde_json::json!({ "wrapped": error.to_plain() })).unwrap();
    let direct = serde_json::to_string(&vec![error.clone()]).unwrap();

    assert!(text.contains(r#""self":"[Circular]""#));
    assert_eq!(direct, format!("[{}]", serde_json::to_string(&error).unwrap()));
}

#[test]
fn plain_record_matches_serialize() {
    let error = AppError::with_options("m", fixed("m").code(7).field("k", "v"));

    assert_eq!(serde_json::to_value(&error).unwrap(), to_plain(&error));
}

#[test]
fn text_uses_two_space_indent() {
    let error = AppError::with_options("m", fixed("m").code(1));

    assert_eq!(
        to_text(&error),
        "{\n  \"code\": 1,\n  \"message\": \"m\",\n  \"stack\": \"Error: m\"\n}"
    );
}

#[test]
fn functions_serialize_as_markers() {
    let error = AppError::with_options("m", fixed("m"));
    error.set("handler", noop("handler"));

    let plain = to_plain(&error);

    assert_eq!(plain["handler"], serde_json::json!("[Function]"));
}

#[test]
fn plain_record_of_deep_cycle() {
    let error = AppError::with_options("m", fixed("m"));
    let a = Value::empty_object();
    let b = Value::array(vec![a.clone()]);
    a.set("b", b);
    a.set("error", error.clone());
    error.set("a", a);

    let plain = to_plain(&error);

    assert_eq!(
        plain["a"],
        serde_json::json!({"b": ["[Circular]"], "error": "[Circular]"})
    );
}
