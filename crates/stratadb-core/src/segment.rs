//! The segment: one id tracker, one vector storage, one payload storage
//! and one vector index composed into a single mutation/query unit.
//!
//! # Concurrency
//!
//! The id tracker's lock is the serialization point. Every mutation takes
//! it exclusively for the whole logical operation, so mutations are
//! single-writer per segment and a concurrent reader can never observe an
//! offset that resolves in the tracker but is absent from storage. Readers
//! take read locks only and run concurrently with each other.
//!
//! Lock order is fixed everywhere: tracker, vector storage, payload
//! storage, index.
//!
//! # Deletion visibility
//!
//! `delete_point` marks the tracker first, then storage, payload and
//! index, all under the tracker's write lock: once the lock drops,
//! `resolve` misses immediately and no read path can see a half-deleted
//! record.

use crate::config::{IndexKind, PayloadStorageKind, SegmentConfig, VectorStorageKind};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::id_tracker::{IdTracker, TRACKER_FILE};
use crate::index::{HnswIndex, SearchFilter, VectorIndexEnum};
use crate::payload_storage::{InMemoryPayloadStorage, PayloadStorageEnum};
use crate::point::{Payload, PointId, PointOffset, ScoredPoint, SeqNumber};
use crate::vector_storage::{InMemoryVectorStorage, VectorStorageEnum};
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the persisted index snapshot inside a segment directory.
pub const INDEX_SNAPSHOT_FILE: &str = "index.snapshot";

/// A single similarity-search segment.
pub struct Segment {
    path: PathBuf,
    config: SegmentConfig,
    id_tracker: RwLock<IdTracker>,
    vector_storage: RwLock<VectorStorageEnum>,
    payload_storage: RwLock<PayloadStorageEnum>,
    index: RwLock<VectorIndexEnum>,
}

impl Segment {
    /// Creates a new segment in `path`.
    ///
    /// The configuration is validated against the driver registry before
    /// anything is constructed, then persisted alongside the data.
    pub fn create<P: AsRef<Path>>(path: P, config: SegmentConfig) -> Result<Self> {
        config.validate().map_err(Error::from)?;
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        config.save(&path).map_err(Error::from)?;

        let vector_storage = open_vector_storage(&config, &path)?;
        let payload_storage = open_payload_storage(&config, &path)?;
        let index = VectorIndexEnum::empty(&config, &path)?;

        info!(
            segment = %config.name,
            dimension = config.dimension,
            storage = config.vector_storage.name(),
            index = config.index.name(),
            "segment created"
        );
        Ok(Self {
            path,
            config,
            id_tracker: RwLock::new(IdTracker::new()),
            vector_storage: RwLock::new(vector_storage),
            payload_storage: RwLock::new(payload_storage),
            index: RwLock::new(index),
        })
    }

    /// Opens a previously created segment from `path`.
    ///
    /// The tracker comes back from its snapshot, the index from its own
    /// snapshot when present and loadable, from a full rebuild otherwise.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let config = SegmentConfig::load(&path).map_err(Error::from)?;

        let id_tracker = if path.join(TRACKER_FILE).exists() {
            IdTracker::load(&path)?
        } else {
            IdTracker::new()
        };
        let vector_storage = open_vector_storage(&config, &path)?;
        let payload_storage = open_payload_storage(&config, &path)?;

        let snapshot_path = path.join(INDEX_SNAPSHOT_FILE);
        let index = if config.index == IndexKind::Hnsw && snapshot_path.exists() {
            match HnswIndex::load(&snapshot_path) {
                Ok(loaded) => VectorIndexEnum::Hnsw(loaded),
                Err(err) => {
                    warn!(error = %err, "index snapshot unreadable, rebuilding");
                    VectorIndexEnum::build(&config, &path, &vector_storage, &id_tracker)?
                }
            }
        } else {
            VectorIndexEnum::build(&config, &path, &vector_storage, &id_tracker)?
        };

        info!(
            segment = %config.name,
            points = id_tracker.live_count(),
            "segment opened"
        );
        Ok(Self {
            path,
            config,
            id_tracker: RwLock::new(id_tracker),
            vector_storage: RwLock::new(vector_storage),
            payload_storage: RwLock::new(payload_storage),
            index: RwLock::new(index),
        })
    }

    /// The segment configuration.
    #[must_use]
    pub const fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Number of live points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.id_tracker.read().live_count()
    }

    /// True if `id` resolves to a live point.
    #[must_use]
    pub fn contains(&self, id: PointId) -> bool {
        self.id_tracker.read().resolve(id).is_some()
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.config.dimension {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            })
        }
    }

    /// Inserts a new point or updates an existing one.
    ///
    /// A mutation whose sequence number is not newer than the last applied
    /// for the point is a no-op returning `Ok(false)`, which makes replay
    /// after recovery safe. `payload: None` leaves existing metadata
    /// untouched (vector payload and metadata are independently optional).
    pub fn upsert_point(
        &self,
        seq: SeqNumber,
        id: PointId,
        vector: &[f32],
        payload: Option<&Payload>,
    ) -> Result<bool> {
        self.check_dimension(vector)?;

        let mut tracker = self.id_tracker.write();
        if let Some(offset) = tracker.resolve(id) {
            if is_stale(&tracker, offset, seq) {
                debug!(%id, seq, "stale upsert ignored");
                return Ok(false);
            }
        }
        let offset = tracker.resolve_or_allocate(id)?;

        let mut vectors = self.vector_storage.write();
        let mut payloads = self.payload_storage.write();
        let mut index = self.index.write();

        vectors.insert(offset, vector)?;
        if let Some(payload) = payload {
            payloads.set(id, payload)?;
        }
        index.upsert(offset, vector)?;
        tracker.set_version(offset, seq);
        Ok(true)
    }

    /// Replaces the vector of an existing point.
    ///
    /// Unlike [`Segment::upsert_point`] this never creates a record: an
    /// unknown id fails with [`Error::MissingPoint`]. That distinct error
    /// is the entire behavioral difference between the two entry points.
    pub fn update_vectors(&self, seq: SeqNumber, id: PointId, vector: &[f32]) -> Result<bool> {
        self.check_dimension(vector)?;

        let mut tracker = self.id_tracker.write();
        let Some(offset) = tracker.resolve(id) else {
            return Err(Error::MissingPoint(id));
        };
        if is_stale(&tracker, offset, seq) {
            debug!(%id, seq, "stale vector update ignored");
            return Ok(false);
        }

        let mut vectors = self.vector_storage.write();
        let mut index = self.index.write();

        vectors.insert(offset, vector)?;
        index.upsert(offset, vector)?;
        tracker.set_version(offset, seq);
        Ok(true)
    }

    /// Soft-deletes a point in all four components.
    ///
    /// Returns `Ok(false)` if the id was unknown — deleting an absent
    /// point is a benign miss, not an error.
    pub fn delete_point(&self, id: PointId) -> Result<bool> {
        let mut tracker = self.id_tracker.write();
        let Some(offset) = tracker.mark_deleted(id) else {
            return Ok(false);
        };

        let mut vectors = self.vector_storage.write();
        let mut payloads = self.payload_storage.write();
        let mut index = self.index.write();

        vectors.delete(offset)?;
        payloads.clear(id)?;
        index.remove(offset)?;
        debug!(%id, offset, "point deleted");
        Ok(true)
    }

    /// Replaces the full payload of an existing point.
    pub fn set_payload(&self, id: PointId, payload: &Payload) -> Result<()> {
        let tracker = self.id_tracker.write();
        if tracker.resolve(id).is_none() {
            return Err(Error::MissingPoint(id));
        }
        self.payload_storage.write().set(id, payload)
    }

    /// Removes the given payload fields of an existing point, returning
    /// the removed values.
    pub fn delete_payload_keys(&self, id: PointId, keys: &[&str]) -> Result<Vec<JsonValue>> {
        let tracker = self.id_tracker.write();
        if tracker.resolve(id).is_none() {
            return Err(Error::MissingPoint(id));
        }
        self.payload_storage.write().delete(id, keys)
    }

    /// Top-k similarity search.
    ///
    /// Results carry external ids only; offsets never cross the segment
    /// boundary. With a filter, only points whose payload satisfies it are
    /// returned. `with_payload` hydrates each hit's metadata.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        with_payload: bool,
    ) -> Result<Vec<ScoredPoint>> {
        self.check_dimension(query)?;

        let tracker = self.id_tracker.read();
        let payloads = self.payload_storage.read();
        let index = self.index.read();

        let hits = match filter {
            Some(condition) => {
                // A payload read failure inside the predicate counts as a
                // non-match; the filter contract promises only that every
                // returned point satisfies the condition.
                let predicate = |offset: PointOffset| -> bool {
                    tracker.translate(offset).is_some_and(|id| {
                        payloads
                            .get(id)
                            .map(|doc| condition.matches(&doc))
                            .unwrap_or(false)
                    })
                };
                index.search(
                    query,
                    top_k,
                    Some(&SearchFilter {
                        condition,
                        predicate: &predicate,
                    }),
                )?
            }
            None => index.search(query, top_k, None)?,
        };

        let mut points = Vec::with_capacity(hits.len());
        for hit in hits {
            // A concurrent delete between index read and translation shows
            // up as a miss here; skip rather than surface a dead offset.
            let Some(id) = tracker.translate(hit.offset) else {
                continue;
            };
            let payload = if with_payload {
                let doc = payloads.get(id)?;
                (!doc.is_empty()).then_some(doc)
            } else {
                None
            };
            points.push(ScoredPoint {
                id,
                score: hit.score,
                payload,
            });
        }
        Ok(points)
    }

    /// Reads a point's vector. `Ok(None)` if the id is unknown or the
    /// point is in a metadata-only transient state.
    pub fn get_vector(&self, id: PointId) -> Result<Option<Vec<f32>>> {
        let tracker = self.id_tracker.read();
        let vectors = self.vector_storage.read();

        let Some(offset) = tracker.resolve(id) else {
            return Ok(None);
        };
        match vectors.get(offset) {
            Ok(vector) => Ok(Some(vector.into_owned())),
            Err(Error::VectorNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Reads a point's payload; empty if none was ever set.
    pub fn get_payload(&self, id: PointId) -> Result<Payload> {
        self.payload_storage.read().get(id)
    }

    /// Durability barrier: flushes persistent storage and persists the
    /// tracker. A no-op for fully volatile segments apart from the tracker
    /// snapshot.
    pub fn flush(&self) -> Result<()> {
        let tracker = self.id_tracker.read();
        let mut vectors = self.vector_storage.write();
        vectors.flush()?;
        tracker.save(&self.path)?;
        Ok(())
    }

    /// Clean-shutdown hook: flushes, then snapshots the index.
    pub fn snapshot(&self) -> Result<()> {
        self.flush()?;
        let index = self.index.read();
        index.snapshot(&self.path.join(INDEX_SNAPSHOT_FILE))
    }

    /// Rebuilds the index from scratch over all live offsets and swaps it
    /// in. The build runs against a consistent read view; abandoning it on
    /// error leaves the previous index untouched.
    pub fn build_index(&self) -> Result<()> {
        let tracker = self.id_tracker.read();
        let vectors = self.vector_storage.read();
        let fresh = VectorIndexEnum::build(&self.config, &self.path, &vectors, &tracker)?;
        drop(vectors);

        *self.index.write() = fresh;
        Ok(())
    }

    /// Verifies the tracker's bijection invariant.
    pub fn check_integrity(&self) -> Result<()> {
        self.id_tracker.read().check_integrity()
    }
}

fn is_stale(tracker: &IdTracker, offset: PointOffset, seq: SeqNumber) -> bool {
    tracker.version(offset).is_some_and(|applied| seq <= applied)
}

fn open_vector_storage(config: &SegmentConfig, path: &Path) -> Result<VectorStorageEnum> {
    match config.vector_storage {
        VectorStorageKind::Memory => Ok(VectorStorageEnum::InMemory(InMemoryVectorStorage::new(
            config.dimension,
        ))),
        VectorStorageKind::Mmap => open_mmap_storage(config, path),
        VectorStorageKind::Basalt => open_basalt_vector_storage(config, path),
    }
}

#[cfg(feature = "persistence")]
fn open_mmap_storage(config: &SegmentConfig, path: &Path) -> Result<VectorStorageEnum> {
    let storage =
        crate::vector_storage::MmapVectorStorage::open(path.join("vectors"), config.dimension)?;
    Ok(VectorStorageEnum::Mmap(storage))
}

#[cfg(not(feature = "persistence"))]
fn open_mmap_storage(config: &SegmentConfig, _path: &Path) -> Result<VectorStorageEnum> {
    // Config validation rejects this earlier; kept for exhaustiveness.
    let _ = config;
    Err(Error::Config(
        "vector storage 'mmap' requires the 'persistence' feature".to_string(),
    ))
}

#[cfg(feature = "external-engine")]
fn open_basalt_vector_storage(config: &SegmentConfig, path: &Path) -> Result<VectorStorageEnum> {
    let options = crate::engine::CollectionOptions::new(config.dimension, config.metric);
    let storage = crate::vector_storage::BasaltVectorStorage::open(
        &path.join("basalt_vectors"),
        &config.name,
        &options,
    )?;
    Ok(VectorStorageEnum::Basalt(storage))
}

#[cfg(not(feature = "external-engine"))]
fn open_basalt_vector_storage(config: &SegmentConfig, _path: &Path) -> Result<VectorStorageEnum> {
    let _ = config;
    Err(Error::Config(
        "vector storage 'basalt' requires the 'external-engine' feature".to_string(),
    ))
}

fn open_payload_storage(config: &SegmentConfig, path: &Path) -> Result<PayloadStorageEnum> {
    match config.payload_storage {
        PayloadStorageKind::Memory => {
            Ok(PayloadStorageEnum::InMemory(InMemoryPayloadStorage::new()))
        }
        PayloadStorageKind::Basalt => open_basalt_payload_storage(config, path),
    }
}

#[cfg(feature = "external-engine")]
fn open_basalt_payload_storage(config: &SegmentConfig, path: &Path) -> Result<PayloadStorageEnum> {
    let options = crate::engine::CollectionOptions::new(config.dimension, config.metric);
    let storage = crate::payload_storage::BasaltPayloadStorage::open(
        &path.join("basalt_payloads"),
        &config.name,
        &options,
    )?;
    Ok(PayloadStorageEnum::Basalt(storage))
}

#[cfg(not(feature = "external-engine"))]
fn open_basalt_payload_storage(config: &SegmentConfig, _path: &Path) -> Result<PayloadStorageEnum> {
    let _ = config;
    Err(Error::Config(
        "payload storage 'basalt' requires the 'external-engine' feature".to_string(),
    ))
}
