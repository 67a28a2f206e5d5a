//! Tests for the in-memory payload storage backend.

use super::{InMemoryPayloadStorage, PayloadStorageEnum};
use crate::point::{Payload, PointId};
use serde_json::json;

fn storage() -> PayloadStorageEnum {
    PayloadStorageEnum::InMemory(InMemoryPayloadStorage::new())
}

fn doc(pairs: &[(&str, serde_json::Value)]) -> Payload {
    let mut payload = Payload::new();
    for (key, value) in pairs {
        payload.insert(*key, value.clone());
    }
    payload
}

#[test]
fn test_set_replaces_whole_document() {
    let mut storage = storage();
    let id = PointId::Num(1);

    storage
        .set(id, &doc(&[("a", json!(1)), ("b", json!(2))]))
        .unwrap();
    storage.set(id, &doc(&[("c", json!(3))])).unwrap();

    let got = storage.get(id).unwrap();
    assert_eq!(got.get("a"), None);
    assert_eq!(got.get("c"), Some(&json!(3)));
}

#[test]
fn test_get_absent_is_empty_document() {
    let storage = storage();
    let got = storage.get(PointId::Num(404)).unwrap();
    assert!(got.is_empty());
}

#[test]
fn test_set_by_key_merges_single_field() {
    let mut storage = storage();
    let id = PointId::Num(1);
    storage.set(id, &doc(&[("keep", json!("yes"))])).unwrap();

    storage.set_by_key(id, "rank", json!(5)).unwrap();

    let got = storage.get(id).unwrap();
    assert_eq!(got.get("keep"), Some(&json!("yes")));
    assert_eq!(got.get("rank"), Some(&json!(5)));
}

#[test]
fn test_set_by_key_creates_document_implicitly() {
    let mut storage = storage();
    let id = PointId::Num(2);

    storage.set_by_key(id, "tag", json!("fresh")).unwrap();
    assert_eq!(storage.get(id).unwrap().get("tag"), Some(&json!("fresh")));
}

#[test]
fn test_delete_returns_removed_values_only() {
    let mut storage = storage();
    let id = PointId::Num(1);
    storage
        .set(id, &doc(&[("a", json!(1)), ("b", json!(2))]))
        .unwrap();

    let removed = storage.delete(id, &["a", "missing"]).unwrap();
    assert_eq!(removed, vec![json!(1)]);

    // Emptying the metadata does not delete the record's document slot.
    let removed = storage.delete(id, &["b"]).unwrap();
    assert_eq!(removed, vec![json!(2)]);
    assert!(storage.get(id).unwrap().is_empty());
}

#[test]
fn test_clear_drops_the_document() {
    let mut storage = storage();
    let id = PointId::Num(1);
    storage.set(id, &doc(&[("a", json!(1))])).unwrap();

    let previous = storage.clear(id).unwrap();
    assert_eq!(previous.unwrap().get("a"), Some(&json!(1)));
    assert!(storage.clear(id).unwrap().is_none());
}

#[test]
fn test_iter_visits_each_document_once_in_stable_order() {
    let mut storage = storage();
    for n in [3u64, 1, 2] {
        storage
            .set(PointId::Num(n), &doc(&[("n", json!(n))]))
            .unwrap();
    }

    let mut first_pass = Vec::new();
    storage
        .iter(|id, _| {
            first_pass.push(id);
            Ok(true)
        })
        .unwrap();
    let mut second_pass = Vec::new();
    storage
        .iter(|id, _| {
            second_pass.push(id);
            Ok(true)
        })
        .unwrap();

    assert_eq!(first_pass.len(), 3);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_iter_stops_when_callback_returns_false() {
    let mut storage = storage();
    for n in 0..5u64 {
        storage.set(PointId::Num(n), &doc(&[])).unwrap();
    }

    let mut seen = 0;
    storage
        .iter(|_, _| {
            seen += 1;
            Ok(seen < 2)
        })
        .unwrap();
    assert_eq!(seen, 2);
}
