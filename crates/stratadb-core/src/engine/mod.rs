//! Safe owned wrappers over the Basalt engine C API.
//!
//! Every handle crossing the foreign boundary is wrapped in an owned type
//! whose `Drop` releases it exactly once, on every exit path. Nothing here
//! relies on implicit finalization timing: the engine guards file
//! descriptors, so release order is enforced structurally (a
//! [`Collection`] closes its collection handle before the engine it came
//! from is destroyed).
//!
//! Every status code is checked; non-zero statuses surface unchanged as
//! [`Error::Engine`]. No call is retried here — the core cannot tell
//! transient from permanent engine failures, so retry policy stays with
//! the caller.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use basalt_sys as sys;
use std::ffi::CString;
use std::os::raw::c_int;
use std::path::Path;
use std::ptr::{self, NonNull};
use tracing::{debug, warn};

/// Maximum payload document size accepted from the engine on reads.
const PAYLOAD_READ_CAPACITY: usize = 64 * 1024;

fn check(call: &'static str, status: c_int) -> Result<()> {
    if status == sys::BASALT_OK {
        Ok(())
    } else {
        Err(Error::Engine { call, status })
    }
}

fn cstring(value: &str, what: &'static str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| Error::Storage(format!("{what} contains an interior NUL byte")))
}

fn path_cstring(path: &Path) -> Result<CString> {
    let utf8 = path
        .to_str()
        .ok_or_else(|| Error::Storage(format!("non-UTF-8 path: {}", path.display())))?;
    cstring(utf8, "path")
}

/// An owned Basalt engine instance rooted at a working directory.
struct Engine {
    raw: NonNull<sys::BasaltEngine>,
}

impl Engine {
    fn create(work_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(work_dir)?;
        let dir = path_cstring(work_dir)?;
        // SAFETY: `dir` is a valid NUL-terminated string for the duration
        // of the call; the engine copies what it needs.
        let raw = unsafe { sys::basalt_engine_create(dir.as_ptr()) };
        NonNull::new(raw)
            .map(|raw| Self { raw })
            .ok_or(Error::Engine {
                call: "basalt_engine_create",
                status: -1,
            })
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // SAFETY: `raw` was obtained from basalt_engine_create and is
        // destroyed exactly once, here. Collections opened from it are
        // closed first (see `Collection`'s field order and Drop).
        unsafe { sys::basalt_engine_destroy(self.raw.as_ptr()) };
    }
}

/// Parameters for creating a Basalt collection.
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Engine-side index type name.
    pub index_type: String,
    /// Engine-side storage driver name.
    pub storage_driver: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Distance metric.
    pub metric: DistanceMetric,
}

impl CollectionOptions {
    /// Options for a collection backing a vector store or graph index.
    #[must_use]
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            index_type: "hnsw".to_string(),
            storage_driver: "pagestore".to_string(),
            dimension,
            metric,
        }
    }
}

/// An exclusively-owned Basalt collection handle.
///
/// Each storage or index instance owns exactly one of these; it is
/// released exactly once, in `Drop`, after which no further calls are
/// possible by construction. There is intentionally no explicit `close`
/// method — a closed-but-live wrapper would turn a type-system guarantee
/// into a runtime check.
pub struct Collection {
    raw: NonNull<sys::BasaltCollection>,
    // Declared after `raw`: `Drop` closes the collection explicitly before
    // this field's drop destroys the engine.
    _engine: Engine,
    name: String,
    dimension: usize,
}

// SAFETY: Basalt handles are plain pointers into an engine that
// synchronizes internal state itself; the wrapper adds no thread-affine
// state. Mutating entry points still go through the segment's locks.
unsafe impl Send for Collection {}
// SAFETY: see above; concurrent reads are supported by the engine.
unsafe impl Sync for Collection {}

impl Collection {
    /// Opens `name` under `work_dir`, creating it with `options` if it
    /// does not exist yet.
    pub fn create_or_open(work_dir: &Path, name: &str, options: &CollectionOptions) -> Result<Self> {
        let engine = Engine::create(work_dir)?;
        let c_name = cstring(name, "collection name")?;

        // SAFETY: engine and name outlive the call.
        let mut raw = unsafe { sys::basalt_collection_open(engine.raw.as_ptr(), c_name.as_ptr()) };

        if raw.is_null() {
            let index_type = cstring(&options.index_type, "index type")?;
            let storage_driver = cstring(&options.storage_driver, "storage driver")?;
            let metric = cstring(options.metric.engine_name(), "distance metric")?;
            let config = sys::BasaltCollectionConfig {
                index_type: index_type.as_ptr(),
                storage_driver: storage_driver.as_ptr(),
                dimension: options.dimension as u32,
                distance_metric: metric.as_ptr(),
                config_json: ptr::null(),
            };
            // SAFETY: all pointers in `config` stay valid for the call;
            // the engine copies the configuration.
            raw = unsafe {
                sys::basalt_collection_create(engine.raw.as_ptr(), c_name.as_ptr(), &config)
            };
        }

        let raw = NonNull::new(raw).ok_or(Error::Engine {
            call: "basalt_collection_create",
            status: -1,
        })?;
        debug!(collection = name, dimension = options.dimension, "basalt collection ready");
        Ok(Self {
            raw,
            _engine: engine,
            name: name.to_string(),
            dimension: options.dimension,
        })
    }

    /// The collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The vector dimension the collection was created with.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Inserts or replaces the vector stored under `key`.
    pub fn upsert_vector(&self, key: u64, vector: &[f32]) -> Result<()> {
        let wire = sys::BasaltVector {
            data: vector.as_ptr().cast_mut(),
            len: vector.len() as u32,
            dim: self.dimension as u32,
        };
        // SAFETY: the buffer is valid for the call; the engine copies it
        // before returning (no ownership transfer across the boundary).
        let status = unsafe { sys::basalt_upsert(self.raw.as_ptr(), key, &wire, ptr::null()) };
        check("basalt_upsert", status)
    }

    /// Inserts or replaces the JSON payload stored under `key`.
    pub fn upsert_payload(&self, key: u64, json: &str) -> Result<()> {
        let c_json = cstring(json, "payload json")?;
        let wire = sys::BasaltPayload {
            json: c_json.as_ptr().cast_mut(),
            len: json.len() as u32,
        };
        // SAFETY: the buffer is valid for the call and copied by the engine.
        let status = unsafe { sys::basalt_upsert(self.raw.as_ptr(), key, ptr::null(), &wire) };
        check("basalt_upsert", status)
    }

    /// Reads the vector stored under `key`. `Ok(None)` if the key is
    /// absent or deleted.
    pub fn get_vector(&self, key: u64) -> Result<Option<Vec<f32>>> {
        let mut buffer = vec![0.0f32; self.dimension];
        let mut wire = sys::BasaltVector {
            data: buffer.as_mut_ptr(),
            len: buffer.len() as u32,
            dim: self.dimension as u32,
        };
        // SAFETY: the out-buffer holds `dimension` elements, which is the
        // capacity advertised in `wire.len`.
        let status =
            unsafe { sys::basalt_get(self.raw.as_ptr(), key, &mut wire, ptr::null_mut()) };
        if status == sys::BASALT_ERR_NOT_FOUND {
            return Ok(None);
        }
        check("basalt_get", status)?;
        Ok(Some(buffer))
    }

    /// Reads the JSON payload stored under `key`. `Ok(None)` if the key is
    /// absent, deleted, or has no payload.
    pub fn get_payload(&self, key: u64) -> Result<Option<String>> {
        let mut buffer = vec![0u8; PAYLOAD_READ_CAPACITY];
        let mut wire = sys::BasaltPayload {
            json: buffer.as_mut_ptr().cast(),
            len: buffer.len() as u32,
        };
        // SAFETY: the out-buffer capacity is advertised in `wire.len`; the
        // engine writes the actual length back into the same field.
        let status =
            unsafe { sys::basalt_get(self.raw.as_ptr(), key, ptr::null_mut(), &mut wire) };
        if status == sys::BASALT_ERR_NOT_FOUND {
            return Ok(None);
        }
        check("basalt_get", status)?;

        buffer.truncate(wire.len as usize);
        let json = String::from_utf8(buffer)
            .map_err(|e| Error::Serialization(format!("invalid UTF-8 in engine payload: {e}")))?;
        if json.is_empty() {
            Ok(None)
        } else {
            Ok(Some(json))
        }
    }

    /// Soft-deletes `key`. Returns true if a live record existed.
    pub fn delete(&self, key: u64) -> Result<bool> {
        // SAFETY: plain call against a live handle.
        let status = unsafe { sys::basalt_delete(self.raw.as_ptr(), key) };
        if status == sys::BASALT_ERR_NOT_FOUND {
            return Ok(false);
        }
        check("basalt_delete", status)?;
        Ok(true)
    }

    /// Count of live records.
    #[must_use]
    pub fn count(&self) -> usize {
        // SAFETY: plain call against a live handle.
        unsafe { sys::basalt_count(self.raw.as_ptr()) as usize }
    }

    /// Nearest-neighbour search. `filter_json` is the serialized condition
    /// tree in the engine's exchange format.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter_json: Option<&str>,
    ) -> Result<Vec<(u64, f32)>> {
        let wire_query = sys::BasaltVector {
            data: query.as_ptr().cast_mut(),
            len: query.len() as u32,
            dim: self.dimension as u32,
        };
        let mut hits = vec![sys::BasaltSearchResult { key: 0, score: 0.0 }; top_k];
        let mut count: u32 = 0;

        let status = match filter_json {
            Some(json) => {
                let c_filter = cstring(json, "filter json")?;
                // SAFETY: query, filter and result buffers are valid for
                // the call; `hits` capacity equals `top_k`.
                unsafe {
                    sys::basalt_search_filtered(
                        self.raw.as_ptr(),
                        &wire_query,
                        top_k as u32,
                        c_filter.as_ptr(),
                        hits.as_mut_ptr(),
                        &mut count,
                    )
                }
            }
            // SAFETY: as above, minus the filter.
            None => unsafe {
                sys::basalt_search(
                    self.raw.as_ptr(),
                    &wire_query,
                    top_k as u32,
                    hits.as_mut_ptr(),
                    &mut count,
                )
            },
        };
        check("basalt_search", status)?;

        hits.truncate(count as usize);
        Ok(hits.into_iter().map(|h| (h.key, h.score)).collect())
    }

    /// Persists the collection's index state inside the engine.
    pub fn save_snapshot(&self) -> Result<()> {
        // SAFETY: plain call against a live handle.
        let status = unsafe { sys::basalt_save_snapshot(self.raw.as_ptr()) };
        check("basalt_save_snapshot", status)
    }

    /// Forces buffered engine writes to disk.
    pub fn flush(&self) -> Result<()> {
        // SAFETY: plain call against a live handle.
        let status = unsafe { sys::basalt_flush(self.raw.as_ptr()) };
        check("basalt_flush", status)
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        // SAFETY: the handle is live (no other path closes it) and this
        // runs exactly once. The engine field drops afterwards.
        let status = unsafe { sys::basalt_collection_close(self.raw.as_ptr()) };
        if status != sys::BASALT_OK {
            warn!(collection = %self.name, status, "basalt collection close failed");
        }
    }
}
