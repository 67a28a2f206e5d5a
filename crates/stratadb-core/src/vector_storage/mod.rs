//! Vector storage backends.
//!
//! Storage is addressed by dense internal offsets and polymorphic over a
//! closed set of backends: a volatile in-process store, a memory-mapped
//! store, and the Basalt external engine. The set is fixed at build time,
//! so every operation dispatches through an exhaustive match instead of an
//! open trait object.

mod in_memory;
#[cfg(feature = "persistence")]
mod mmap;

#[cfg(feature = "external-engine")]
mod basalt;

#[cfg(all(test, feature = "persistence"))]
mod mmap_tests;

pub use in_memory::InMemoryVectorStorage;
#[cfg(feature = "persistence")]
pub use mmap::MmapVectorStorage;

#[cfg(feature = "external-engine")]
pub use basalt::BasaltVectorStorage;

use crate::error::{Error, Result};
use crate::point::PointOffset;
use std::borrow::Cow;

/// A vector storage backend.
///
/// All variants share one contract: vectors live at dense offsets, the
/// dimension is fixed at creation, deletion is soft and never renumbers
/// the remaining offsets.
pub enum VectorStorageEnum {
    /// Volatile in-process storage.
    InMemory(InMemoryVectorStorage),
    /// Memory-mapped file storage.
    #[cfg(feature = "persistence")]
    Mmap(MmapVectorStorage),
    /// Basalt external persistent engine.
    #[cfg(feature = "external-engine")]
    Basalt(BasaltVectorStorage),
}

impl VectorStorageEnum {
    /// The dimension this storage was created with.
    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            Self::InMemory(s) => s.dimension(),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => s.dimension(),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.dimension(),
        }
    }

    /// Inserts or replaces the vector at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DimensionMismatch`] before any state changes if
    /// the vector length disagrees with the configured dimension.
    pub fn insert(&mut self, offset: PointOffset, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.dimension(),
                actual: vector.len(),
            });
        }
        match self {
            Self::InMemory(s) => s.insert(offset, vector),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => s.insert(offset, vector),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.insert(offset, vector),
        }
    }

    /// Reads the live vector at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::VectorNotFound`] if no vector was inserted at
    /// the offset or it has been deleted.
    pub fn get(&self, offset: PointOffset) -> Result<Cow<'_, [f32]>> {
        match self {
            Self::InMemory(s) => s.get(offset),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => s.get(offset),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.get(offset),
        }
    }

    /// Soft-deletes the vector at `offset`.
    ///
    /// Returns true if a live vector existed. Remaining offsets are not
    /// renumbered.
    pub fn delete(&mut self, offset: PointOffset) -> Result<bool> {
        match self {
            Self::InMemory(s) => Ok(s.delete(offset)),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => Ok(s.delete(offset)),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.delete(offset),
        }
    }

    /// Bulk-copies vectors from another storage, translating offsets per
    /// the supplied `(source, destination)` mapping. Used when rebuilding
    /// or compacting a segment.
    ///
    /// After the copy, `get(destination)` is byte-identical to
    /// `other.get(source)` for every mapped pair.
    pub fn update_from(
        &mut self,
        other: &Self,
        offset_mapping: &[(PointOffset, PointOffset)],
    ) -> Result<()> {
        for &(src, dst) in offset_mapping {
            let vector = other.get(src)?.into_owned();
            self.insert(dst, &vector)?;
        }
        Ok(())
    }

    /// True when mutations need an explicit [`VectorStorageEnum::flush`]
    /// to be considered durable.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        match self {
            Self::InMemory(_) => false,
            #[cfg(feature = "persistence")]
            Self::Mmap(_) => true,
            #[cfg(feature = "external-engine")]
            Self::Basalt(_) => true,
        }
    }

    /// Count of live (non-deleted) vectors.
    #[must_use]
    pub fn total_count(&self) -> usize {
        match self {
            Self::InMemory(s) => s.total_count(),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => s.total_count(),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.total_count(),
        }
    }

    /// Forces buffered writes to durable media. A no-op for the volatile
    /// variant.
    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::InMemory(_) => Ok(()),
            #[cfg(feature = "persistence")]
            Self::Mmap(s) => s.flush(),
            #[cfg(feature = "external-engine")]
            Self::Basalt(s) => s.flush(),
        }
    }
}
