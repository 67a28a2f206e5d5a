//! Payload storage backends.
//!
//! Payloads are keyed by external id, not by offset: metadata is attached
//! to a record's identity, not to its physical slot. Like vector storage,
//! the backend set is closed at build time and dispatched exhaustively.

mod in_memory;

#[cfg(feature = "external-engine")]
mod basalt;

#[cfg(test)]
mod in_memory_tests;

pub use in_memory::InMemoryPayloadStorage;

#[cfg(feature = "external-engine")]
pub use basalt::BasaltPayloadStorage;

use crate::error::Result;
use crate::point::{Payload, PointId};
use serde_json::Value as JsonValue;

/// A payload storage backend.
pub enum PayloadStorageEnum {
    /// In-process document map.
    InMemory(InMemoryPayloadStorage),
    /// Basalt external engine with a write-through cache.
    #[cfg(feature = "external-engine")]
    Basalt(BasaltPayloadStorage),
}

impl PayloadStorageEnum {
    /// Replaces the entire document for `id`.
    pub fn set(&mut self, id: PointId, payload: &Payload) -> Result<()> {
        match self {
            Self::InMemory(s) => s.set(id, payload),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.set(id, payload),
        }
    }

    /// Merges a single field into the document for `id` without disturbing
    /// the others. An id with no document gets an empty one implicitly —
    /// this backend family never requires a prior `set`.
    pub fn set_by_key(&mut self, id: PointId, key: &str, value: JsonValue) -> Result<()> {
        match self {
            Self::InMemory(s) => s.set_by_key(id, key, value),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.set_by_key(id, key, value),
        }
    }

    /// Reads the document for `id`. An id that never had a document yields
    /// an empty payload, not an error.
    pub fn get(&self, id: PointId) -> Result<Payload> {
        match self {
            Self::InMemory(s) => Ok(s.get(id)),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.get(id),
        }
    }

    /// Removes the given fields from the document for `id`, returning the
    /// removed values. Removing every field empties the document but does
    /// not delete the record.
    pub fn delete(&mut self, id: PointId, keys: &[&str]) -> Result<Vec<JsonValue>> {
        match self {
            Self::InMemory(s) => s.delete(id, keys),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.delete(id, keys),
        }
    }

    /// Drops the whole document for `id`, returning it if one existed.
    /// Used when the record itself is deleted.
    pub fn clear(&mut self, id: PointId) -> Result<Option<Payload>> {
        match self {
            Self::InMemory(s) => Ok(s.clear(id)),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.clear(id),
        }
    }

    /// Visits every stored document exactly once. Iteration order is
    /// unspecified but stable within a single call; the callback returns
    /// `Ok(false)` to stop early.
    pub fn iter<F>(&self, callback: F) -> Result<()>
    where
        F: FnMut(PointId, &Payload) -> Result<bool>,
    {
        match self {
            Self::InMemory(s) => s.iter(callback),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.iter(callback),
        }
    }
}
