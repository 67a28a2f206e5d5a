//! Vector index backends.
//!
//! Like the storage layers, the index is a closed set of variants
//! dispatched exhaustively: an exact flat scan, an in-process HNSW graph,
//! and the Basalt engine's external graph index. All variants speak in
//! internal offsets; translating results back to external ids is the
//! segment's job.

mod flat;
pub mod hnsw;

#[cfg(feature = "external-engine")]
mod basalt;


pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

#[cfg(feature = "external-engine")]
pub use basalt::BasaltIndex;

use crate::config::{IndexKind, SegmentConfig};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::id_tracker::IdTracker;
use crate::point::PointOffset;
use crate::vector_storage::VectorStorageEnum;
use std::path::Path;
use tracing::info;

/// A search hit in offset space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredOffset {
    /// Internal offset of the matching vector.
    pub offset: PointOffset,
    /// Score under the segment metric.
    pub score: f32,
}

/// A filter handed to the index, in both forms a backend might need.
///
/// In-process variants evaluate `predicate` per offset; the Basalt variant
/// serializes `condition` into its exchange form instead, since the engine
/// knows nothing of this crate's closures.
pub struct SearchFilter<'a> {
    /// The structured condition tree.
    pub condition: &'a Filter,
    /// The condition resolved against this segment's payloads.
    pub predicate: &'a dyn Fn(PointOffset) -> bool,
}

/// A vector index backend.
pub enum VectorIndexEnum {
    /// Exact brute-force scan.
    Flat(FlatIndex),
    /// In-process HNSW graph.
    Hnsw(HnswIndex),
    /// Basalt's external graph index.
    #[cfg(feature = "external-engine")]
    Basalt(BasaltIndex),
}

impl VectorIndexEnum {
    /// Creates an empty index of the configured kind.
    pub fn empty(config: &SegmentConfig, path: &Path) -> Result<Self> {
        match config.index {
            IndexKind::Flat => Ok(Self::Flat(FlatIndex::new(config.metric))),
            IndexKind::Hnsw => Ok(Self::Hnsw(HnswIndex::new(config.metric, config.hnsw))),
            IndexKind::Basalt => open_basalt_index(config, path),
        }
    }

    /// Full rebuild from scratch over all live offsets.
    ///
    /// Builds into a fresh structure so the caller can abandon the result
    /// without corrupting shared state; swapping the result in is the
    /// caller's atomic step. Offsets in a metadata-only transient state
    /// (no vector yet) are skipped.
    pub fn build(
        config: &SegmentConfig,
        path: &Path,
        storage: &VectorStorageEnum,
        tracker: &IdTracker,
    ) -> Result<Self> {
        let mut index = Self::empty(config, path)?;
        let mut indexed = 0usize;
        for (_, offset) in tracker.iter_live() {
            match storage.get(offset) {
                Ok(vector) => {
                    index.upsert(offset, &vector)?;
                    indexed += 1;
                }
                Err(Error::VectorNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        info!(
            kind = config.index.name(),
            indexed, "vector index built"
        );
        Ok(index)
    }

    /// Incremental insertion or update of one offset.
    pub fn upsert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        match self {
            Self::Flat(i) => {
                i.upsert(offset, vector);
                Ok(())
            }
            Self::Hnsw(i) => {
                i.upsert(offset, vector);
                Ok(())
            }
            #[cfg(feature = "external-engine")]
            Self::Basalt(i) => i.upsert(offset, vector),
        }
    }

    /// Marks an offset unsearchable. Returns true if it was indexed.
    pub fn remove(&mut self, offset: PointOffset) -> Result<bool> {
        match self {
            Self::Flat(i) => Ok(i.remove(offset)),
            Self::Hnsw(i) => Ok(i.remove(offset)),
            #[cfg(feature = "external-engine")]
            Self::Basalt(i) => i.remove(offset),
        }
    }

    /// Top-k search in offset space, best score first, ties broken by
    /// ascending offset.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter<'_>>,
    ) -> Result<Vec<ScoredOffset>> {
        match self {
            Self::Flat(i) => Ok(i.search(query, top_k, filter.map(|f| f.predicate))),
            Self::Hnsw(i) => Ok(i.search(query, top_k, filter.map(|f| f.predicate))),
            #[cfg(feature = "external-engine")]
            Self::Basalt(i) => i.search(query, top_k, filter.map(|f| f.condition)),
        }
    }

    /// Number of live offsets in the index.
    #[must_use]
    pub fn indexed_count(&self) -> usize {
        match self {
            Self::Flat(i) => i.indexed_count(),
            Self::Hnsw(i) => i.indexed_count(),
            #[cfg(feature = "external-engine")]
            Self::Basalt(i) => i.indexed_count(),
        }
    }

    /// Persists index state that needs durability beyond the underlying
    /// storage. The flat scan rebuilds cheaply and keeps no such state; the
    /// Basalt engine snapshots inside its own working area.
    pub fn snapshot(&self, path: &Path) -> Result<()> {
        match self {
            Self::Flat(_) => Ok(()),
            Self::Hnsw(i) => i.snapshot(path),
            #[cfg(feature = "external-engine")]
            Self::Basalt(i) => i.snapshot(),
        }
    }
}

#[cfg(feature = "external-engine")]
fn open_basalt_index(config: &SegmentConfig, path: &Path) -> Result<VectorIndexEnum> {
    let options = crate::engine::CollectionOptions::new(config.dimension, config.metric);
    let index = BasaltIndex::open(&path.join("basalt_index"), &config.name, &options)?;
    Ok(VectorIndexEnum::Basalt(index))
}

#[cfg(not(feature = "external-engine"))]
fn open_basalt_index(config: &SegmentConfig, _path: &Path) -> Result<VectorIndexEnum> {
    // Config validation rejects this earlier; kept for exhaustiveness.
    Err(Error::Config(format!(
        "index '{}' requires the 'external-engine' feature",
        config.index.name()
    )))
}
