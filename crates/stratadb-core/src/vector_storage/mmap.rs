//! Memory-mapped vector storage.
//!
//! Vectors live in a single data file at fixed positions: the vector for
//! offset `o` occupies bytes `[o * dimension * 4, (o + 1) * dimension * 4)`.
//! Offsets are dense and assigned by the id tracker, so no per-vector index
//! is needed; a sidecar file carries the occupancy bitmap and dimension.
//!
//! The data file grows geometrically and is remapped on growth. Callers
//! serialize mutations externally (the segment holds this storage behind a
//! write lock), so no internal locking is done here.
//!
//! # Sidecar format (`vectors.meta`)
//!
//! ```text
//! [Magic: "SVEC" 4 bytes]
//! [Version: 1 byte]
//! [bincode: dimension, occupancy bitmap]
//! ```

use crate::error::{Error, Result};
use crate::point::PointOffset;
use memmap2::MmapMut;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const META_MAGIC: &[u8; 4] = b"SVEC";
const META_VERSION: u8 = 1;

const DATA_FILE: &str = "vectors.dat";
const META_FILE: &str = "vectors.meta";

/// 4 MB initial data file, enough for small segments without any resize.
const INITIAL_SIZE: u64 = 4 * 1024 * 1024;
/// Minimum growth step; keeps remap frequency low on steady ingestion.
const MIN_GROWTH: u64 = 16 * 1024 * 1024;
/// Each resize at least doubles capacity for amortized O(1) growth.
const GROWTH_FACTOR: u64 = 2;

#[derive(Serialize, Deserialize)]
struct MmapMeta {
    dimension: usize,
    occupied: RoaringBitmap,
}

/// Memory-mapped file storage for vectors.
pub struct MmapVectorStorage {
    path: PathBuf,
    dimension: usize,
    data_file: File,
    mmap: MmapMut,
    /// Live offsets. A deleted slot leaves its bytes in place; only the
    /// bitmap decides liveness.
    occupied: RoaringBitmap,
}

impl MmapVectorStorage {
    /// Creates a new storage in `path` or reopens an existing one.
    ///
    /// # Errors
    ///
    /// Fails on IO errors or if an existing storage was created with a
    /// different dimension.
    pub fn open<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;

        let data_path = path.join(DATA_FILE);
        let data_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&data_path)?;
        if data_file.metadata()?.len() == 0 {
            data_file.set_len(INITIAL_SIZE)?;
        }

        // SAFETY: the file is open read/write and set_len() guarantees the
        // mapped range is allocated.
        let mmap = unsafe { MmapMut::map_mut(&data_file)? };

        let meta_path = path.join(META_FILE);
        let occupied = if meta_path.exists() {
            let meta = Self::load_meta(&meta_path)?;
            if meta.dimension != dimension {
                return Err(Error::Storage(format!(
                    "storage at {} has dimension {}, segment expects {}",
                    path.display(),
                    meta.dimension,
                    dimension
                )));
            }
            meta.occupied
        } else {
            RoaringBitmap::new()
        };

        Ok(Self {
            path,
            dimension,
            data_file,
            mmap,
            occupied,
        })
    }

    /// The configured dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_bytes(&self) -> u64 {
        (self.dimension * 4) as u64
    }

    fn slot_range(&self, offset: PointOffset) -> (usize, usize) {
        let start = u64::from(offset) * self.vector_bytes();
        (start as usize, (start + self.vector_bytes()) as usize)
    }

    /// Grows and remaps the data file so `required_len` bytes are
    /// addressable.
    fn ensure_capacity(&mut self, required_len: u64) -> Result<()> {
        let current_len = self.mmap.len() as u64;
        if current_len >= required_len {
            return Ok(());
        }

        // Flush before unmapping the old view.
        self.mmap.flush()?;

        let doubled = current_len.saturating_mul(GROWTH_FACTOR);
        let with_headroom = required_len.saturating_add(MIN_GROWTH);
        let new_len = doubled.max(with_headroom);

        self.data_file.set_len(new_len)?;
        // SAFETY: same file, freshly extended; the previous map was
        // replaced, not aliased.
        self.mmap = unsafe { MmapMut::map_mut(&self.data_file)? };

        debug!(
            path = %self.path.display(),
            old_len = current_len,
            new_len,
            "grew vector data file"
        );
        Ok(())
    }

    pub(super) fn insert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        debug_assert_eq!(vector.len(), self.dimension);
        let (start, end) = self.slot_range(offset);
        self.ensure_capacity(end as u64)?;

        for (chunk, value) in self.mmap[start..end].chunks_exact_mut(4).zip(vector) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        self.occupied.insert(offset);
        Ok(())
    }

    pub(super) fn get(&self, offset: PointOffset) -> Result<Cow<'_, [f32]>> {
        if !self.occupied.contains(offset) {
            return Err(Error::VectorNotFound(offset));
        }
        let (start, end) = self.slot_range(offset);
        let vector: Vec<f32> = self.mmap[start..end]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Cow::Owned(vector))
    }

    pub(super) fn delete(&mut self, offset: PointOffset) -> bool {
        self.occupied.remove(offset)
    }

    pub(super) fn total_count(&self) -> usize {
        self.occupied.len() as usize
    }

    /// Flushes the data file and rewrites the sidecar atomically.
    pub(super) fn flush(&mut self) -> Result<()> {
        self.mmap.flush()?;

        let meta = MmapMeta {
            dimension: self.dimension,
            occupied: self.occupied.clone(),
        };
        let final_path = self.path.join(META_FILE);
        let tmp_path = self.path.join(format!("{META_FILE}.tmp"));
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(META_MAGIC)?;
            writer.write_all(&[META_VERSION])?;
            bincode::serialize_into(&mut writer, &meta)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    fn load_meta(meta_path: &Path) -> Result<MmapMeta> {
        let mut reader = BufReader::new(File::open(meta_path)?);
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != META_MAGIC {
            return Err(Error::Serialization("bad vector storage magic".to_string()));
        }
        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != META_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported vector storage version {}",
                version[0]
            )));
        }
        Ok(bincode::deserialize_from(&mut reader)?)
    }
}
