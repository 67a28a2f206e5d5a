//! A single layer in the HNSW hierarchy.

use crate::point::PointOffset;
use serde::{Deserialize, Serialize};

/// Adjacency lists for one layer, indexed by offset.
///
/// Mutation happens under the segment's index write lock, so the lists
/// need no interior locking.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct Layer {
    neighbors: Vec<Vec<PointOffset>>,
}

impl Layer {
    /// Ensures adjacency slots exist up to and including `offset`.
    pub(super) fn ensure_capacity(&mut self, offset: PointOffset) {
        let needed = offset as usize + 1;
        if self.neighbors.len() < needed {
            self.neighbors.resize(needed, Vec::new());
        }
    }

    /// Neighbors of `offset`; empty for out-of-range offsets.
    pub(super) fn get(&self, offset: PointOffset) -> &[PointOffset] {
        self.neighbors
            .get(offset as usize)
            .map_or(&[], Vec::as_slice)
    }

    /// Replaces the adjacency list of `offset`.
    pub(super) fn set(&mut self, offset: PointOffset, neighbors: Vec<PointOffset>) {
        if let Some(slot) = self.neighbors.get_mut(offset as usize) {
            *slot = neighbors;
        }
    }

    /// Clears the adjacency list of `offset`.
    pub(super) fn clear(&mut self, offset: PointOffset) {
        if let Some(slot) = self.neighbors.get_mut(offset as usize) {
            slot.clear();
        }
    }
}
