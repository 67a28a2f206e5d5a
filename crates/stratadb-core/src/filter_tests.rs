//! Tests for `filter` module

use super::filter::*;
use super::point::Payload;
use serde_json::json;

fn doc() -> Payload {
    let mut payload = Payload::new();
    payload.insert("category", json!("tech"));
    payload.insert("price", json!(150));
    payload.insert("meta", json!({"author": {"name": "ada"}}));
    payload.insert("nothing", json!(null));
    payload
}

#[test]
fn test_eq_and_neq() {
    let payload = doc();
    assert!(Filter::new(Condition::eq("category", "tech")).matches(&payload));
    assert!(!Filter::new(Condition::eq("category", "food")).matches(&payload));
    assert!(Filter::new(Condition::neq("category", "food")).matches(&payload));
    // Absent field: eq misses, neq matches.
    assert!(!Filter::new(Condition::eq("missing", 1)).matches(&payload));
    assert!(Filter::new(Condition::neq("missing", 1)).matches(&payload));
}

#[test]
fn test_nested_dot_notation() {
    let payload = doc();
    assert!(Filter::new(Condition::eq("meta.author.name", "ada")).matches(&payload));
    assert!(!Filter::new(Condition::eq("meta.author.age", 36)).matches(&payload));
}

#[test]
fn test_numeric_ranges() {
    let payload = doc();
    assert!(Filter::new(Condition::gt("price", 100)).matches(&payload));
    assert!(!Filter::new(Condition::gt("price", 150)).matches(&payload));
    assert!(Filter::new(Condition::gte("price", 150)).matches(&payload));
    assert!(Filter::new(Condition::lt("price", 200)).matches(&payload));
    assert!(Filter::new(Condition::lte("price", 150)).matches(&payload));
}

#[test]
fn test_range_on_mismatched_types_is_false() {
    let payload = doc();
    assert!(!Filter::new(Condition::gt("category", 10)).matches(&payload));
}

#[test]
fn test_in_condition() {
    let payload = doc();
    let filter = Filter::new(Condition::is_in(
        "category",
        vec![json!("food"), json!("tech")],
    ));
    assert!(filter.matches(&payload));
    let filter = Filter::new(Condition::is_in("category", vec![json!("food")]));
    assert!(!filter.matches(&payload));
}

#[test]
fn test_is_null_covers_absent_and_null() {
    let payload = doc();
    assert!(Filter::new(Condition::is_null("missing")).matches(&payload));
    assert!(Filter::new(Condition::is_null("nothing")).matches(&payload));
    assert!(!Filter::new(Condition::is_null("category")).matches(&payload));
}

#[test]
fn test_boolean_combinators() {
    let payload = doc();
    let both = Condition::and(vec![
        Condition::eq("category", "tech"),
        Condition::gt("price", 100),
    ]);
    assert!(Filter::new(both).matches(&payload));

    let either = Condition::or(vec![
        Condition::eq("category", "food"),
        Condition::gt("price", 100),
    ]);
    assert!(Filter::new(either).matches(&payload));

    let negated = Condition::not(Condition::eq("category", "tech"));
    assert!(!Filter::new(negated).matches(&payload));
}

#[test]
fn test_exchange_json_roundtrip() {
    let filter = Filter::new(Condition::and(vec![
        Condition::eq("category", "tech"),
        Condition::not(Condition::is_null("price")),
    ]));
    let json = filter.to_exchange_json().unwrap();
    // Tagged representation: the foreign side dispatches on "type".
    assert!(json.contains(r#""type":"and""#));

    let back: Filter = serde_json::from_str(&json).unwrap();
    assert!(back.matches(&doc()));
}
