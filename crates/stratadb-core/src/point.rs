//! Point identifiers, offsets and payload documents.
//!
//! A point is addressed externally by a [`PointId`] (numeric or UUID) and
//! internally by a dense [`PointOffset`] assigned by the id tracker. Offsets
//! are an implementation detail of one segment and never cross the system
//! boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Dense internal slot number within one segment.
///
/// Offsets grow monotonically and are never reused after deletion, so a
/// stale offset held across a delete can never be reinterpreted as a
/// different record.
pub type PointOffset = u32;

/// Mutation sequence number, assigned by the caller and monotonically
/// increasing per point.
pub type SeqNumber = u64;

/// External identifier of a point.
///
/// Applications address records either by unsigned 64-bit integers or by
/// UUIDs. On the wire an id is a JSON number or a canonical UUID string;
/// arbitrary strings are rejected at deserialization, not coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Numeric identifier.
    Num(u64),
    /// UUID identifier.
    Uuid(Uuid),
}

impl PointId {
    /// Returns true for the numeric variant.
    #[must_use]
    pub const fn is_num(&self) -> bool {
        matches!(self, Self::Num(_))
    }
}

/// Numeric ids order by value, UUIDs by byte value, and every numeric id
/// orders before every UUID. This matches the tracker's two-map layout so
/// `iter_live` output is sorted without extra work.
impl Ord for PointId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Num(_), Self::Uuid(_)) => Ordering::Less,
            (Self::Uuid(_), Self::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PointId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

impl From<Uuid> for PointId {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

/// Structured metadata attached to a point by identity.
///
/// A payload is a flat-to-nested JSON object. Absence of a payload is
/// represented by an empty document, never by an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Map<String, JsonValue>);

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Looks up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Sets a single field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(key.into(), value)
    }

    /// Removes a single field, returning its value if it was set.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.0.remove(key)
    }

    /// Merges `other` into `self`, field by field. Fields present in both
    /// take `other`'s value.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Iterates over top-level fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }
}

impl From<serde_json::Map<String, JsonValue>> for Payload {
    fn from(map: serde_json::Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// A search hit: the matching point's external id, its score under the
/// segment metric, and (when requested) its hydrated payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// External identifier of the matching point.
    pub id: PointId,
    /// Score (interpretation depends on the distance metric).
    pub score: f32,
    /// Hydrated payload, `None` unless requested.
    pub payload: Option<Payload>,
}
