//! Tests covering path navigation, raw projection and redaction.

use rstest::rstest;
use serde_json::json;

use super::{Kind, Node, Origin, Scalar};
use crate::error::StrataError;

fn tree(raw: serde_json::Value) -> Node {
    Node::from_raw(&raw, &Origin::named("test.json"))
}

#[test]
fn fetch_returns_the_nested_scalar() {
    let t = tree(json!({"a": {"b": 5}}));
    let node = t
        .fetch("a.b", ".")
        .unwrap_or_else(|e| panic!("fetch failed: {e}"));
    assert_eq!(node.to_raw(), json!(5));
}

#[test]
fn fetch_addresses_arrays_by_numeric_index() {
    let t = tree(json!({"a": [10, 20]}));
    let node = t
        .fetch("a.1", ".")
        .unwrap_or_else(|e| panic!("fetch failed: {e}"));
    assert_eq!(node.to_raw(), json!(20));
}

#[rstest]
#[case::missing_map_key(json!({"a": {}}), "a.b")]
#[case::index_past_the_end(json!({"a": [1, 2]}), "a.5")]
fn fetch_misses_are_not_found(#[case] raw: serde_json::Value, #[case] key: &str) {
    let err = tree(raw)
        .fetch(key, ".")
        .err()
        .unwrap_or_else(|| panic!("expected a miss"));
    assert!(matches!(&*err, StrataError::NotFound { key: k } if k == key));
}

#[rstest]
#[case::named_key_into_array(json!({"a": [1, 2]}), "a.b")]
#[case::descend_into_scalar(json!({"a": 1}), "a.b")]
fn fetch_shape_conflicts_are_type_mismatches(#[case] raw: serde_json::Value, #[case] key: &str) {
    let err = tree(raw)
        .fetch(key, ".")
        .err()
        .unwrap_or_else(|| panic!("expected a mismatch"));
    assert!(matches!(&*err, StrataError::TypeMismatch { .. }), "got: {err}");
}

#[test]
fn fetch_honours_a_custom_delimiter() {
    let t = tree(json!({"outer": {"inner": true}}));
    let node = t
        .fetch("outer/inner", "/")
        .unwrap_or_else(|e| panic!("fetch failed: {e}"));
    assert_eq!(node.to_raw(), json!(true));
}

#[test]
fn raw_projection_round_trips_and_strips_origins() {
    let raw = json!({"name": "svc", "port": 8080, "ratio": 0.25, "tags": ["a", "b"], "on": true});
    let t = tree(raw.clone());
    assert_eq!(t.to_raw(), raw);
}

#[test]
fn numbers_keep_their_textual_form() {
    let t = tree(json!({"big": 9007199254740993_i64}));
    let node = t
        .fetch("big", ".")
        .unwrap_or_else(|e| panic!("fetch failed: {e}"));
    let Kind::Scalar(Scalar::Number(n)) = node.kind() else {
        panic!("expected a number");
    };
    assert_eq!(n.text(), "9007199254740993");
}

#[test]
fn redaction_copies_and_leaves_the_source_alone() {
    let mut t = tree(json!({"password": "hunter2", "host": "db"}));
    if let Kind::Map(entries) = &mut t.kind {
        if let Some(node) = entries.get_mut("password") {
            node.mark_secret();
        }
    }

    let redacted = t.to_redacted();
    assert_eq!(
        redacted.to_raw(),
        json!({"password": "REDACTED", "host": "db"})
    );
    assert_eq!(
        t.to_raw(),
        json!({"password": "hunter2", "host": "db"}),
        "source must not be mutated"
    );
}

#[test]
fn secret_subtrees_redact_every_leaf() {
    let mut t = tree(json!({"creds": {"user": "u", "pass": "p"}}));
    if let Kind::Map(entries) = &mut t.kind {
        if let Some(node) = entries.get_mut("creds") {
            node.mark_secret();
        }
    }

    assert_eq!(
        t.to_redacted().to_raw(),
        json!({"creds": {"user": "REDACTED", "pass": "REDACTED"}})
    );
}

#[test]
fn emptiness_requires_no_origins() {
    assert!(Node::default().is_empty());
    assert!(!tree(json!(null)).is_empty(), "decoded null has an origin");
    assert!(!tree(json!({})).is_empty());
}
