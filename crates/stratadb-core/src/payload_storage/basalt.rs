//! Basalt-backed payload storage with a write-through cache.
//!
//! Documents are stored in the engine as JSON envelopes and mirrored in a
//! full in-process cache, so reads normally cost no foreign call. Writes
//! update the engine first and the cache second: a reader can observe a
//! durable write the cache has not absorbed yet, but never the reverse,
//! so a crash cannot lose metadata the cache claimed to have.
//!
//! # Wire keys
//!
//! The engine addresses records by u64 key only. Numeric ids map to their
//! value; UUID ids to an xor-fold of their 128 bits. The envelope echoes
//! the exact external id and is verified on every read, so a fold
//! collision is detected instead of silently serving the wrong document.
//!
//! # Iteration
//!
//! The engine exposes no iteration call, so `iter` visits the cache. The
//! cache is complete for everything written through this process; documents
//! written by an earlier process surface once read.

use crate::engine::{Collection, CollectionOptions};
use crate::error::{Error, Result};
use crate::point::{Payload, PointId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct PayloadEnvelope {
    id: PointId,
    doc: Payload,
}

fn wire_key(id: PointId) -> u64 {
    match id {
        PointId::Num(n) => n,
        PointId::Uuid(u) => {
            let bits = u.as_u128();
            ((bits >> 64) ^ bits) as u64
        }
    }
}

/// Payload storage delegating durability to the Basalt engine.
pub struct BasaltPayloadStorage {
    collection: Collection,
    cache: RwLock<FxHashMap<PointId, Payload>>,
}

impl BasaltPayloadStorage {
    /// Opens or creates the backing engine collection.
    pub fn open(path: &Path, name: &str, options: &CollectionOptions) -> Result<Self> {
        let collection = Collection::create_or_open(path, name, options)?;
        Ok(Self {
            collection,
            cache: RwLock::new(FxHashMap::default()),
        })
    }

    fn write_through(&self, id: PointId, doc: &Payload) -> Result<()> {
        let envelope = PayloadEnvelope {
            id,
            doc: doc.clone(),
        };
        let json = serde_json::to_string(&envelope)?;
        self.collection.upsert_payload(wire_key(id), &json)?;
        self.cache.write().insert(id, doc.clone());
        Ok(())
    }

    fn read_through(&self, id: PointId) -> Result<Option<Payload>> {
        if let Some(doc) = self.cache.read().get(&id) {
            return Ok(Some(doc.clone()));
        }
        let Some(json) = self.collection.get_payload(wire_key(id))? else {
            return Ok(None);
        };
        let envelope: PayloadEnvelope = serde_json::from_str(&json)?;
        if envelope.id != id {
            return Err(Error::Storage(format!(
                "wire key collision: requested {id}, engine returned {}",
                envelope.id
            )));
        }
        self.cache.write().insert(id, envelope.doc.clone());
        Ok(Some(envelope.doc))
    }

    pub(super) fn set(&mut self, id: PointId, payload: &Payload) -> Result<()> {
        self.write_through(id, payload)
    }

    pub(super) fn set_by_key(&mut self, id: PointId, key: &str, value: JsonValue) -> Result<()> {
        let mut doc = self.read_through(id)?.unwrap_or_default();
        doc.insert(key, value);
        self.write_through(id, &doc)
    }

    pub(super) fn get(&self, id: PointId) -> Result<Payload> {
        Ok(self.read_through(id)?.unwrap_or_default())
    }

    pub(super) fn delete(&mut self, id: PointId, keys: &[&str]) -> Result<Vec<JsonValue>> {
        let Some(mut doc) = self.read_through(id)? else {
            return Ok(Vec::new());
        };
        let removed: Vec<JsonValue> = keys.iter().filter_map(|key| doc.remove(key)).collect();
        if !removed.is_empty() {
            self.write_through(id, &doc)?;
        }
        Ok(removed)
    }

    pub(super) fn clear(&mut self, id: PointId) -> Result<Option<Payload>> {
        let previous = self.read_through(id)?;
        if previous.is_some() {
            self.collection.delete(wire_key(id))?;
            self.cache.write().remove(&id);
        }
        Ok(previous)
    }

    pub(super) fn iter<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(PointId, &Payload) -> Result<bool>,
    {
        let cache = self.cache.read();
        for (&id, payload) in cache.iter() {
            if !callback(id, payload)? {
                break;
            }
        }
        Ok(())
    }
}
