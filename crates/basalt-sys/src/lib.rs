//! Low-level FFI bindings to the Basalt persistent vector engine.
//!
//! This crate declares the raw, unsafe C API of Basalt: opaque engine and
//! collection handles plus the calls the storage/index adapters translate
//! into. For safe, owned wrappers see the `engine` module of
//! `stratadb-core`.
//!
//! # Conventions
//!
//! - All strings cross the boundary as NUL-terminated byte sequences.
//! - Vectors cross as `(pointer, length, dimension)` triples; Basalt copies
//!   the buffer before returning, no ownership transfers.
//! - Every fallible call returns a status code; `BASALT_OK` (zero) means
//!   success, anything else is an engine failure the caller must surface.
//! - Handles are created and destroyed exactly once. Calling into a handle
//!   after `basalt_collection_close` / `basalt_engine_destroy` is undefined
//!   behavior on the C side, not a recoverable error.

#![no_std]
#![allow(non_camel_case_types)]

use core::ffi::{c_char, c_int};

/// Opaque engine instance. One per working directory.
#[repr(C)]
pub struct BasaltEngine {
    _private: [u8; 0],
}

/// Opaque collection handle, obtained from an engine.
#[repr(C)]
pub struct BasaltCollection {
    _private: [u8; 0],
}

/// Collection construction parameters.
///
/// `index_type`, `storage_driver` and `distance_metric` are engine-defined
/// names (e.g. `"hnsw"`, `"pagestore"`, `"cosine"`). `config_json` may be
/// null for engine defaults.
#[repr(C)]
pub struct BasaltCollectionConfig {
    pub index_type: *const c_char,
    pub storage_driver: *const c_char,
    pub dimension: u32,
    pub distance_metric: *const c_char,
    pub config_json: *const c_char,
}

/// A borrowed vector buffer. `len` is the element count of `data`; `dim` is
/// the logical dimension the collection was created with.
///
/// On writes the engine copies from `data`; on reads the caller provides
/// the buffer and the engine fills it. Ownership never transfers.
#[repr(C)]
pub struct BasaltVector {
    pub data: *mut f32,
    pub len: u32,
    pub dim: u32,
}

/// A borrowed UTF-8 JSON document. Same buffer convention as
/// [`BasaltVector`]: caller-owned in both directions, `len` is the byte
/// capacity on reads and the byte length on writes.
#[repr(C)]
pub struct BasaltPayload {
    pub json: *mut c_char,
    pub len: u32,
}

/// One search hit: the record key and its score under the collection metric.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct BasaltSearchResult {
    pub key: u64,
    pub score: f32,
}

/// Success.
pub const BASALT_OK: c_int = 0;
/// The key does not exist in the collection.
pub const BASALT_ERR_NOT_FOUND: c_int = 1;
/// Disk or page-store failure.
pub const BASALT_ERR_IO: c_int = 2;
/// The collection data failed integrity checks.
pub const BASALT_ERR_CORRUPT: c_int = 3;
/// Allocation failure inside the engine.
pub const BASALT_ERR_OOM: c_int = 4;
/// Malformed argument (bad dimension, unparsable filter, ...).
pub const BASALT_ERR_INVALID: c_int = 5;

extern "C" {
    /// Creates an engine rooted at `work_dir`. Returns null on failure.
    pub fn basalt_engine_create(work_dir: *const c_char) -> *mut BasaltEngine;

    /// Destroys an engine. All collections opened from it must already be
    /// closed; the engine owns file descriptors that must not double-close.
    pub fn basalt_engine_destroy(engine: *mut BasaltEngine);

    /// Creates a new collection. Returns null if it already exists or on
    /// configuration failure.
    pub fn basalt_collection_create(
        engine: *mut BasaltEngine,
        name: *const c_char,
        config: *const BasaltCollectionConfig,
    ) -> *mut BasaltCollection;

    /// Opens an existing collection. Returns null if it does not exist.
    pub fn basalt_collection_open(
        engine: *mut BasaltEngine,
        name: *const c_char,
    ) -> *mut BasaltCollection;

    /// Flushes and closes a collection handle. The handle is invalid
    /// afterwards regardless of the returned status.
    pub fn basalt_collection_close(collection: *mut BasaltCollection) -> c_int;

    /// Inserts or replaces the vector and/or payload stored under `key`.
    /// Either pointer may be null to leave that half untouched. Basalt
    /// copies both buffers before returning.
    pub fn basalt_upsert(
        collection: *mut BasaltCollection,
        key: u64,
        vector: *const BasaltVector,
        payload: *const BasaltPayload,
    ) -> c_int;

    /// Reads the vector and/or payload stored under `key` into
    /// caller-provided buffers. Either out-pointer may be null.
    /// `BASALT_ERR_NOT_FOUND` if the key is absent or deleted.
    pub fn basalt_get(
        collection: *mut BasaltCollection,
        key: u64,
        vector: *mut BasaltVector,
        payload: *mut BasaltPayload,
    ) -> c_int;

    /// Soft-deletes `key`. `BASALT_ERR_NOT_FOUND` if it was never inserted.
    pub fn basalt_delete(collection: *mut BasaltCollection, key: u64) -> c_int;

    /// Count of live (non-deleted) records.
    pub fn basalt_count(collection: *mut BasaltCollection) -> u64;

    /// Nearest-neighbour search. Writes at most `top_k` hits into `results`
    /// and the actual number into `count`.
    pub fn basalt_search(
        collection: *mut BasaltCollection,
        query: *const BasaltVector,
        top_k: u32,
        results: *mut BasaltSearchResult,
        count: *mut u32,
    ) -> c_int;

    /// Filtered nearest-neighbour search. `filter_json` is a serialized
    /// condition tree in Basalt's filter exchange format.
    pub fn basalt_search_filtered(
        collection: *mut BasaltCollection,
        query: *const BasaltVector,
        top_k: u32,
        filter_json: *const c_char,
        results: *mut BasaltSearchResult,
        count: *mut u32,
    ) -> c_int;

    /// Persists the collection's index state to the engine's snapshot area.
    pub fn basalt_save_snapshot(collection: *mut BasaltCollection) -> c_int;

    /// Forces buffered writes to disk.
    pub fn basalt_flush(collection: *mut BasaltCollection) -> c_int;
}
