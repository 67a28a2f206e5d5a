//! Exact brute-force vector index.
//!
//! Scores every live offset against the query. Filtering is applied
//! before scoring (pre-filtering), so filtered results are exact: every
//! returned offset satisfies the filter and no qualifying offset within
//! the true top-k is skipped.

use crate::distance::DistanceMetric;
use crate::index::ScoredOffset;
use crate::point::PointOffset;

/// Brute-force scan index.
///
/// Keeps its own offset-indexed copy of the vectors so searches never
/// reach back into storage; the segment feeds it the same upserts and
/// removals as the other variants.
pub struct FlatIndex {
    metric: DistanceMetric,
    vectors: Vec<Option<Vec<f32>>>,
    live: usize,
}

impl FlatIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            vectors: Vec::new(),
            live: 0,
        }
    }

    /// Inserts or replaces one offset.
    pub fn upsert(&mut self, offset: PointOffset, vector: &[f32]) {
        let slot = offset as usize;
        if self.vectors.len() <= slot {
            self.vectors.resize(slot + 1, None);
        }
        if self.vectors[slot].replace(vector.to_vec()).is_none() {
            self.live += 1;
        }
    }

    /// Drops one offset from the scan set. Returns true if it was live.
    pub fn remove(&mut self, offset: PointOffset) -> bool {
        match self.vectors.get_mut(offset as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Exact top-k search, best score first, ties broken by ascending
    /// offset.
    #[must_use]
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        predicate: Option<&dyn Fn(PointOffset) -> bool>,
    ) -> Vec<ScoredOffset> {
        let mut scored: Vec<ScoredOffset> = self
            .vectors
            .iter()
            .enumerate()
            .filter_map(|(slot, vector)| {
                let vector = vector.as_deref()?;
                let offset = slot as PointOffset;
                if predicate.is_some_and(|p| !p(offset)) {
                    return None;
                }
                Some(ScoredOffset {
                    offset,
                    score: self.metric.score(query, vector),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            self.metric
                .cmp_scores(a.score, b.score)
                .then(a.offset.cmp(&b.offset))
        });
        scored.truncate(top_k);
        scored
    }

    /// Number of live offsets.
    #[must_use]
    pub const fn indexed_count(&self) -> usize {
        self.live
    }
}
