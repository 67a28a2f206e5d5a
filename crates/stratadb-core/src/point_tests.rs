//! Tests for `point` module

use super::point::*;
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_point_id_ordering_num_before_uuid() {
    let nil_uuid = PointId::Uuid(Uuid::nil());
    assert!(PointId::Num(u64::MAX) < nil_uuid);
    assert!(PointId::Num(1) < PointId::Num(2));

    let low = PointId::Uuid(Uuid::from_u128(1));
    let high = PointId::Uuid(Uuid::from_u128(2));
    assert!(low < high);
}

#[test]
fn test_point_id_serde_number() {
    let id: PointId = serde_json::from_str("42").unwrap();
    assert_eq!(id, PointId::Num(42));
    assert_eq!(serde_json::to_string(&id).unwrap(), "42");
}

#[test]
fn test_point_id_serde_uuid_string() {
    let uuid = Uuid::new_v4();
    let json = format!("\"{uuid}\"");
    let id: PointId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, PointId::Uuid(uuid));
}

#[test]
fn test_point_id_rejects_arbitrary_strings() {
    // String identifiers are an explicitly unsupported shape, never
    // coerced.
    let result: Result<PointId, _> = serde_json::from_str("\"not-a-uuid\"");
    assert!(result.is_err());
}

#[test]
fn test_point_id_display() {
    assert_eq!(PointId::Num(7).to_string(), "7");
    let uuid = Uuid::nil();
    assert_eq!(
        PointId::Uuid(uuid).to_string(),
        "00000000-0000-0000-0000-000000000000"
    );
}

#[test]
fn test_payload_insert_get_remove() {
    let mut payload = Payload::new();
    assert!(payload.is_empty());

    payload.insert("title", json!("hello"));
    payload.insert("rank", json!(3));
    assert_eq!(payload.len(), 2);
    assert_eq!(payload.get("title"), Some(&json!("hello")));

    assert_eq!(payload.remove("rank"), Some(json!(3)));
    assert_eq!(payload.remove("rank"), None);
    assert_eq!(payload.len(), 1);
}

#[test]
fn test_payload_merge_overwrites() {
    let mut base = Payload::new();
    base.insert("a", json!(1));
    base.insert("b", json!(2));

    let mut other = Payload::new();
    other.insert("b", json!(20));
    other.insert("c", json!(30));

    base.merge(&other);
    assert_eq!(base.get("a"), Some(&json!(1)));
    assert_eq!(base.get("b"), Some(&json!(20)));
    assert_eq!(base.get("c"), Some(&json!(30)));
}

#[test]
fn test_payload_serde_is_transparent() {
    let mut payload = Payload::new();
    payload.insert("tag", json!("x"));
    let json = serde_json::to_string(&payload).unwrap();
    assert_eq!(json, r#"{"tag":"x"}"#);

    let back: Payload = serde_json::from_str(&json).unwrap();
    assert_eq!(back, payload);
}
