//! Volatile in-process vector storage.

use crate::error::{Error, Result};
use crate::point::PointOffset;
use std::borrow::Cow;

/// Offset-indexed vector storage backed by process memory.
///
/// Slots are grown on demand; a deleted slot keeps its position so offsets
/// stay stable for the segment's lifetime.
pub struct InMemoryVectorStorage {
    dimension: usize,
    vectors: Vec<Option<Vec<f32>>>,
    live: usize,
}

impl InMemoryVectorStorage {
    /// Creates an empty storage with the given dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            live: 0,
        }
    }

    /// The configured dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub(super) fn insert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        debug_assert_eq!(vector.len(), self.dimension);
        let slot = offset as usize;
        if slot >= self.vectors.len() {
            self.vectors.resize(slot + 1, None);
        }
        if self.vectors[slot].replace(vector.to_vec()).is_none() {
            self.live += 1;
        }
        Ok(())
    }

    pub(super) fn get(&self, offset: PointOffset) -> Result<Cow<'_, [f32]>> {
        self.vectors
            .get(offset as usize)
            .and_then(Option::as_deref)
            .map(Cow::Borrowed)
            .ok_or(Error::VectorNotFound(offset))
    }

    pub(super) fn delete(&mut self, offset: PointOffset) -> bool {
        match self.vectors.get_mut(offset as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    pub(super) fn total_count(&self) -> usize {
        self.live
    }
}
