//! Basalt-backed vector index.
//!
//! The engine maintains both the graph and the vectors behind one
//! collection handle this index exclusively owns. Filters are serialized
//! into the JSON exchange form before crossing the boundary; whether the
//! engine pre- or post-filters is its own trade-off.

use crate::engine::{Collection, CollectionOptions};
use crate::error::Result;
use crate::filter::Filter;
use crate::index::ScoredOffset;
use crate::point::PointOffset;
use std::path::Path;

/// Vector index delegating search to the Basalt engine.
pub struct BasaltIndex {
    collection: Collection,
}

impl BasaltIndex {
    /// Opens or creates the backing engine collection.
    pub fn open(path: &Path, name: &str, options: &CollectionOptions) -> Result<Self> {
        let collection = Collection::create_or_open(path, name, options)?;
        Ok(Self { collection })
    }

    pub(super) fn upsert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        self.collection.upsert_vector(u64::from(offset), vector)
    }

    pub(super) fn remove(&mut self, offset: PointOffset) -> Result<bool> {
        self.collection.delete(u64::from(offset))
    }

    pub(super) fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredOffset>> {
        let filter_json = filter.map(Filter::to_exchange_json).transpose()?;
        let hits = self
            .collection
            .search(query, top_k, filter_json.as_deref())?;
        Ok(hits
            .into_iter()
            .map(|(key, score)| ScoredOffset {
                offset: key as PointOffset,
                score,
            })
            .collect())
    }

    pub(super) fn indexed_count(&self) -> usize {
        self.collection.count()
    }

    /// The engine persists its index inside its own working area; the
    /// snapshot path used by in-process variants does not apply here.
    pub(super) fn snapshot(&self) -> Result<()> {
        self.collection.save_snapshot()
    }
}
