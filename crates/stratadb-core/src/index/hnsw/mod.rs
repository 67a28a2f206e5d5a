//! In-process HNSW vector index.
//!
//! Approximate nearest neighbor search over the segment's internal
//! offsets. Incremental upserts re-link the affected node; removal defers
//! physical unlinking but guarantees the offset never surfaces in results.
//!
//! # Snapshot format
//!
//! ```text
//! [Magic: "SHNW" 4 bytes]
//! [Version: 1 byte]
//! [bincode: parameters + full graph]
//! ```
//!
//! Snapshots are externally atomic: written to a temp file, then renamed
//! over the target path.

mod graph;
mod layer;
mod ordered_float;


use crate::config::HnswParams;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::ScoredOffset;
use crate::point::PointOffset;
use graph::HnswGraph;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

const SNAPSHOT_MAGIC: &[u8; 4] = b"SHNW";
const SNAPSHOT_VERSION: u8 = 1;

/// Widening factor applied to `ef_search` when a filter is present.
///
/// Filtering is applied after graph traversal, so the candidate pool is
/// oversampled to keep recall bounded under selective filters. This is the
/// documented approximation trade-off of the graph variant; the flat index
/// is exact.
const FILTER_OVERSAMPLING: usize = 4;

/// In-process HNSW graph index.
pub struct HnswIndex {
    metric: DistanceMetric,
    params: HnswParams,
    graph: HnswGraph,
}

impl HnswIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(metric: DistanceMetric, params: HnswParams) -> Self {
        Self {
            metric,
            params,
            graph: HnswGraph::new(metric, &params),
        }
    }

    /// Inserts or updates one offset in the live search structure.
    pub fn upsert(&mut self, offset: PointOffset, vector: &[f32]) {
        self.graph.insert(offset, vector);
    }

    /// Marks an offset unsearchable. Returns true if it was live.
    pub fn remove(&mut self, offset: PointOffset) -> bool {
        self.graph.remove(offset)
    }

    /// Searches for the `top_k` nearest live offsets, best score first,
    /// ties broken by ascending offset.
    #[must_use]
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        predicate: Option<&dyn Fn(PointOffset) -> bool>,
    ) -> Vec<ScoredOffset> {
        let mut ef = self.params.ef_search.max(top_k);
        if predicate.is_some() {
            ef = ef.saturating_mul(FILTER_OVERSAMPLING);
        }

        self.graph
            .search(query, top_k, ef, predicate)
            .into_iter()
            .map(|(offset, dist)| ScoredOffset {
                offset,
                // The graph minimizes uniformly; undo the sign flip for
                // similarity metrics.
                score: if self.metric.higher_is_better() {
                    -dist
                } else {
                    dist
                },
            })
            .collect()
    }

    /// Number of live offsets in the index.
    #[must_use]
    pub fn indexed_count(&self) -> usize {
        self.graph.live_count()
    }

    /// Writes the full graph to `path`, atomically.
    pub fn snapshot(&self, path: &Path) -> Result<()> {
        let tmp_path = tmp_sibling(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(SNAPSHOT_MAGIC)?;
            writer.write_all(&[SNAPSHOT_VERSION])?;
            bincode::serialize_into(&mut writer, &(&self.metric, &self.params, &self.graph))?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), count = self.indexed_count(), "hnsw snapshot written");
        Ok(())
    }

    /// Loads a snapshot written by [`HnswIndex::snapshot`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(Error::Serialization("bad hnsw snapshot magic".to_string()));
        }
        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported hnsw snapshot version {}",
                version[0]
            )));
        }

        let (metric, params, graph): (DistanceMetric, HnswParams, HnswGraph) =
            bincode::deserialize_from(&mut reader)?;
        Ok(Self {
            metric,
            params,
            graph,
        })
    }
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
