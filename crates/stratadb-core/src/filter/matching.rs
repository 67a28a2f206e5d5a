//! Condition evaluation against payload documents.

use super::Condition;
use crate::point::Payload;
use serde_json::Value;
use std::cmp::Ordering;

/// Resolves a dot-notation field path against a payload.
///
/// `"a.b.c"` walks nested objects; a missing segment resolves to `None`.
fn resolve_field<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = payload.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Compares two JSON values for ordering conditions.
///
/// Numbers compare numerically, strings lexicographically. Mixed or
/// non-comparable types yield `None`, which makes the condition false
/// rather than an error: a filter over a heterogeneous field is a benign
/// miss, not a fault.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64()?;
            let y = y.as_f64()?;
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl Condition {
    /// Evaluates this condition against a payload document.
    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        match self {
            Self::Eq { field, value } => {
                resolve_field(payload, field).is_some_and(|v| v == value)
            }
            Self::Neq { field, value } => {
                resolve_field(payload, field).is_none_or(|v| v != value)
            }
            Self::Gt { field, value } => Self::ordered(payload, field, value, Ordering::is_gt),
            Self::Gte { field, value } => Self::ordered(payload, field, value, Ordering::is_ge),
            Self::Lt { field, value } => Self::ordered(payload, field, value, Ordering::is_lt),
            Self::Lte { field, value } => Self::ordered(payload, field, value, Ordering::is_le),
            Self::In { field, values } => {
                resolve_field(payload, field).is_some_and(|v| values.contains(v))
            }
            Self::IsNull { field } => {
                resolve_field(payload, field).is_none_or(Value::is_null)
            }
            Self::And { conditions } => conditions.iter().all(|c| c.matches(payload)),
            Self::Or { conditions } => conditions.iter().any(|c| c.matches(payload)),
            Self::Not { condition } => !condition.matches(payload),
        }
    }

    fn ordered(
        payload: &Payload,
        field: &str,
        value: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> bool {
        resolve_field(payload, field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(accept)
    }
}
