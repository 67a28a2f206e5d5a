//! In-process payload storage.

use crate::error::Result;
use crate::point::{Payload, PointId};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Payload documents held in an ordered in-process map.
///
/// The ordered map gives `iter` a deterministic order (numeric ids first,
/// then UUIDs), which is stronger than the contract requires but free.
#[derive(Debug, Default)]
pub struct InMemoryPayloadStorage {
    docs: BTreeMap<PointId, Payload>,
}

impl InMemoryPayloadStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn set(&mut self, id: PointId, payload: &Payload) -> Result<()> {
        self.docs.insert(id, payload.clone());
        Ok(())
    }

    pub(super) fn set_by_key(&mut self, id: PointId, key: &str, value: JsonValue) -> Result<()> {
        self.docs.entry(id).or_default().insert(key, value);
        Ok(())
    }

    pub(super) fn get(&self, id: PointId) -> Payload {
        self.docs.get(&id).cloned().unwrap_or_default()
    }

    pub(super) fn delete(&mut self, id: PointId, keys: &[&str]) -> Result<Vec<JsonValue>> {
        let Some(doc) = self.docs.get_mut(&id) else {
            return Ok(Vec::new());
        };
        Ok(keys.iter().filter_map(|key| doc.remove(key)).collect())
    }

    pub(super) fn clear(&mut self, id: PointId) -> Option<Payload> {
        self.docs.remove(&id)
    }

    pub(super) fn iter<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(PointId, &Payload) -> Result<bool>,
    {
        for (&id, payload) in &self.docs {
            if !callback(id, payload)? {
                break;
            }
        }
        Ok(())
    }
}
