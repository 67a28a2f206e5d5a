//! Basalt-backed vector storage.
//!
//! Every operation translates 1:1 into a foreign call against the
//! collection handle this storage exclusively owns. Internal offsets are
//! the wire keys: they are dense, never reused, and fit the engine's
//! 64-bit key space trivially.

use crate::engine::{Collection, CollectionOptions};
use crate::error::{Error, Result};
use crate::point::PointOffset;
use std::borrow::Cow;
use std::path::Path;

/// Vector storage delegating persistence to the Basalt engine.
pub struct BasaltVectorStorage {
    collection: Collection,
}

impl BasaltVectorStorage {
    /// Opens or creates the backing engine collection.
    pub fn open(path: &Path, name: &str, options: &CollectionOptions) -> Result<Self> {
        let collection = Collection::create_or_open(path, name, options)?;
        Ok(Self { collection })
    }

    /// The configured dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.collection.dimension()
    }

    pub(super) fn insert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        self.collection.upsert_vector(u64::from(offset), vector)
    }

    pub(super) fn get(&self, offset: PointOffset) -> Result<Cow<'_, [f32]>> {
        self.collection
            .get_vector(u64::from(offset))?
            .map(Cow::Owned)
            .ok_or(Error::VectorNotFound(offset))
    }

    pub(super) fn delete(&mut self, offset: PointOffset) -> Result<bool> {
        self.collection.delete(u64::from(offset))
    }

    pub(super) fn total_count(&self) -> usize {
        self.collection.count()
    }

    pub(super) fn flush(&mut self) -> Result<()> {
        self.collection.flush()
    }
}
