//! Sanitizer invariants: markers, path-local cycle detection, fault isolation.

use crate::common::*;

#[test]
fn self_cycle() {
    let obj = Value::empty_object();
    obj.set("x", obj.clone());

    sanitize(&obj);

    assert_eq!(obj.get("x"), Some(Value::from(CIRCULAR)));
}

#[test]
fn diamond_is_not_circular() {
    let shared = Value::empty_object();
    let obj = Value::empty_object();
    obj.set("a", shared.clone());
    obj.set("b", shared.clone());

    sanitize(&obj);

    assert_ne!(obj.get("a"), Some(Value::from(CIRCULAR)));
    assert_ne!(obj.get("b"), Some(Value::from(CIRCULAR)));
    assert_eq!(obj.get("a").and_then(|v| v.node_id()), shared.node_id());
}

#[test]
fn shared_node_reached_from_cycle_and_sibling() {
    // root.a -> shared -> root (cycle), root.b -> shared (plain sharing)
    let root = Value::empty_object();
    let shared = Value::empty_object();
    root.set("a", shared.clone());
    root.set("b", shared.clone());
    shared.set("up", root.clone());
    shared.set("leaf", Value::Int(1));

    sanitize(&root);

    assert_eq!(shared.get("up"), Some(Value::from(CIRCULAR)));
    assert_eq!(shared.get("leaf"), Some(Value::Int(1)));
    assert_eq!(root.get("b").and_then(|v| v.node_id()), shared.node_id());
    assert!(!has_cycle(&root));
}

#[test]
fn function_inside_entity_extra() {
    let error = AppError::with_options("m", fixed("m").field("callback", noop("cb")));

    assert_eq!(error.get("callback"), Some(Value::from(FUNCTION)));
}

#[test]
fn typed_fields_are_never_markers() {
    let error = AppError::with_options("m", fixed("m").code("E"));
    error.set("me", error.clone());

    error.sanitize();

    assert_eq!(error.message(), "m");
    assert_eq!(error.stack(), "Error: m");
    assert_eq!(error.code(), Some(ErrorCode::Text("E".to_string())));
    assert_eq!(error.get("me"), Some(Value::from(CIRCULAR)));
}

#[test]
fn busy_branch_becomes_circular_error() {
    init_tracing();
    let busy = Value::empty_object();
    let fine = Value::array(vec![Value::from(noop("f"))]);
    let root = Value::object(fields([("busy", busy.clone()), ("fine", fine.clone())]));

    let Value::Object(node) = &busy else {
        unreachable!()
    };
    let guard = node.write();
    sanitize(&root);
    drop(guard);

    assert_eq!(root.get("busy"), Some(Value::from(CIRCULAR_ERROR)));
    assert_eq!(fine.at(0), Some(Value::from(FUNCTION)));
}

#[test]
fn nested_entities_are_walked() {
    let inner = AppError::with_options("inner", fixed("inner"));
    let outer = AppError::with_options("outer", fixed("outer"));
    inner.set("parent", outer.clone());
    outer.set("child", inner.clone());

    outer.sanitize();

    assert_eq!(inner.get("parent"), Some(Value::from(CIRCULAR)));
    assert!(outer.get("child").and_then(|v| v.as_error().cloned()).is_some());
}

fn nested_chain(levels: usize, leaf: (&str, Value)) -> Value {
    let root = Value::empty_object();
    let mut tip = root.clone();
    for _ in 0..levels {
        let next = Value::empty_object();
        tip.set("next", next.clone());
        tip = next;
    }
    tip.set(leaf.0, leaf.1);
    root
}

#[test]
fn deep_acyclic_chain_keeps_every_level() {
    init_tracing();
    let root = nested_chain(150, ("leaf", Value::Int(7)));

    sanitize(&root);

    let rendered = root.to_json().to_string();
    assert!(rendered.contains(r#""leaf":7"#));
    assert!(!rendered.contains(CIRCULAR_ERROR));
}

#[test]
fn deep_payload_survives_wrap_and_serialization() {
    let payload = nested_chain(120, ("detail", Value::from("needed")));

    let error = wrap("boom", fields([("payload", payload)]));
    let text = serde_json::to_string(&error).unwrap();

    assert!(text.contains(r#""detail":"needed""#));
    assert!(!text.contains(CIRCULAR_ERROR));
}
