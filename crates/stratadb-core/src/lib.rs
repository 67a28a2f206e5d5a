//! # `StrataDB` Core
//!
//! A similarity-search segment core with pluggable storage and index
//! backends.
//!
//! A [`Segment`] composes four parts that always agree on which records
//! are live:
//!
//! - an [`id_tracker::IdTracker`] translating external ids (u64 or UUID)
//!   into dense internal offsets,
//! - a vector storage backend (in-memory, memory-mapped, or the Basalt
//!   external engine),
//! - a payload storage backend keyed by external id,
//! - a vector index (flat scan, in-process HNSW, or Basalt's graph).
//!
//! The backend sets are closed at build time: adding an operation is an
//! exhaustive match, not a trait-object hunt. Query and mutation logic in
//! [`Segment`] is identical for every backend combination.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use stratadb_core::{
//!     DistanceMetric, IndexKind, PayloadStorageKind, Segment, SegmentConfig,
//!     VectorStorageKind,
//! };
//!
//! let config = SegmentConfig {
//!     name: "documents".to_string(),
//!     dimension: 768,
//!     metric: DistanceMetric::Cosine,
//!     vector_storage: VectorStorageKind::Mmap,
//!     payload_storage: PayloadStorageKind::Memory,
//!     index: IndexKind::Hnsw,
//!     hnsw: Default::default(),
//! };
//! let segment = Segment::create("./data/documents", config)?;
//!
//! segment.upsert_point(1, 42u64.into(), &embedding, Some(&payload))?;
//! let hits = segment.search(&query, 10, None, true)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod config;
#[cfg(test)]
mod config_tests;
pub mod distance;
#[cfg(test)]
mod distance_tests;
#[cfg(feature = "external-engine")]
pub mod engine;
pub mod error;
pub mod filter;
#[cfg(test)]
mod filter_tests;
pub mod id_tracker;
pub mod index;
pub mod payload_storage;
pub mod point;
#[cfg(test)]
mod point_tests;
pub mod segment;
pub mod vector_storage;

pub use config::{
    ConfigError, HnswParams, IndexKind, PayloadStorageKind, SegmentConfig, StoreConfig,
    VectorStorageKind,
};
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use filter::{Condition, Filter};
pub use id_tracker::IdTracker;
pub use index::{FlatIndex, HnswIndex, ScoredOffset, SearchFilter, VectorIndexEnum};
pub use payload_storage::{InMemoryPayloadStorage, PayloadStorageEnum};
pub use point::{Payload, PointId, PointOffset, ScoredPoint, SeqNumber};
pub use segment::Segment;
pub use vector_storage::{InMemoryVectorStorage, VectorStorageEnum};

#[cfg(feature = "persistence")]
pub use vector_storage::MmapVectorStorage;
