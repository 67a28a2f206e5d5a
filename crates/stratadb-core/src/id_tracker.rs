//! Bidirectional mapping between external point ids and internal offsets.
//!
//! The tracker owns the segment's identity state: two ordered forward maps
//! (one per id variant), a dense reverse array indexed by offset, a
//! soft-deletion bitmap and the per-offset mutation sequence numbers.
//! Offsets are allocated densely and never reused; deletion flips a bit and
//! removes the forward entry, it never renumbers anything.
//!
//! Absence is always an explicit `None`, never an error: looking up an id
//! or offset that does not exist is a normal outcome on these paths.
//!
//! # Snapshot format
//!
//! ```text
//! [Magic: "STRK" 4 bytes]
//! [Version: 1 byte]
//! [bincode: forward maps, deleted bitmap, versions, slot count]
//! ```
//!
//! The reverse array is rebuilt from the forward maps on load; slots of
//! deleted offsets come back empty, which is indistinguishable from the
//! live state as far as `translate` is concerned.

use crate::error::{Error, Result};
use crate::point::{PointId, PointOffset, SeqNumber};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

const SNAPSHOT_MAGIC: &[u8; 4] = b"STRK";
const SNAPSHOT_VERSION: u8 = 1;

/// File name of the persisted tracker state inside a segment directory.
pub const TRACKER_FILE: &str = "id_tracker.bin";

/// Owns the external-id to internal-offset bijection for one segment.
#[derive(Debug, Default)]
pub struct IdTracker {
    /// Forward map for numeric ids.
    num_to_offset: BTreeMap<u64, PointOffset>,
    /// Forward map for UUID ids.
    uuid_to_offset: BTreeMap<Uuid, PointOffset>,
    /// Reverse array, index = offset. Entries survive deletion so offsets
    /// stay defined for result sets held across a delete.
    offset_to_id: Vec<Option<PointId>>,
    /// Soft-deleted offsets.
    deleted: RoaringBitmap,
    /// Last applied mutation sequence number per offset.
    versions: Vec<Option<SeqNumber>>,
}

#[derive(Serialize, Deserialize)]
struct TrackerSnapshot {
    num_to_offset: BTreeMap<u64, PointOffset>,
    uuid_to_offset: BTreeMap<Uuid, PointOffset>,
    deleted: RoaringBitmap,
    versions: Vec<Option<SeqNumber>>,
    slots: u32,
}

impl IdTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an external id to its live internal offset.
    ///
    /// Returns `None` if the id was never seen or has been deleted.
    #[must_use]
    pub fn resolve(&self, id: PointId) -> Option<PointOffset> {
        match id {
            PointId::Num(n) => self.num_to_offset.get(&n).copied(),
            PointId::Uuid(u) => self.uuid_to_offset.get(&u).copied(),
        }
    }

    /// Resolves an id, allocating the next unused offset if it is unknown.
    ///
    /// Allocation is dense: the first point gets offset 0, each new point
    /// the previous maximum plus one. An id deleted earlier gets a fresh
    /// offset, never its old one back.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment exhausted its offset space.
    pub fn resolve_or_allocate(&mut self, id: PointId) -> Result<PointOffset> {
        if let Some(offset) = self.resolve(id) {
            return Ok(offset);
        }
        let offset = PointOffset::try_from(self.offset_to_id.len())
            .map_err(|_| Error::Storage("segment offset space exhausted".to_string()))?;
        match id {
            PointId::Num(n) => {
                self.num_to_offset.insert(n, offset);
            }
            PointId::Uuid(u) => {
                self.uuid_to_offset.insert(u, offset);
            }
        }
        self.offset_to_id.push(Some(id));
        self.versions.push(None);
        Ok(offset)
    }

    /// Translates an internal offset back to its external id.
    ///
    /// Returns `None` if the offset was never allocated or is deleted.
    #[must_use]
    pub fn translate(&self, offset: PointOffset) -> Option<PointId> {
        if self.deleted.contains(offset) {
            return None;
        }
        self.offset_to_id.get(offset as usize).copied().flatten()
    }

    /// Soft-deletes an id: removes it from the forward maps and flips the
    /// deletion bit for its offset. The reverse-array slot is retained.
    ///
    /// Returns the freed offset, or `None` if the id was unknown.
    pub fn mark_deleted(&mut self, id: PointId) -> Option<PointOffset> {
        let offset = match id {
            PointId::Num(n) => self.num_to_offset.remove(&n),
            PointId::Uuid(u) => self.uuid_to_offset.remove(&u),
        }?;
        self.deleted.insert(offset);
        Some(offset)
    }

    /// True if the offset is soft-deleted.
    #[must_use]
    pub fn is_deleted(&self, offset: PointOffset) -> bool {
        self.deleted.contains(offset)
    }

    /// Iterates over live `(id, offset)` pairs: numeric ids first, then
    /// UUIDs, each group in ascending id order. The iterator reflects the
    /// tracker state at call time and can be restarted by calling again.
    pub fn iter_live(&self) -> impl Iterator<Item = (PointId, PointOffset)> + '_ {
        self.num_to_offset
            .iter()
            .map(|(&n, &o)| (PointId::Num(n), o))
            .chain(
                self.uuid_to_offset
                    .iter()
                    .map(|(&u, &o)| (PointId::Uuid(u), o)),
            )
    }

    /// Number of live points.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.num_to_offset.len() + self.uuid_to_offset.len()
    }

    /// Number of offsets ever allocated, live or deleted.
    #[must_use]
    pub fn total_allocated(&self) -> usize {
        self.offset_to_id.len()
    }

    /// Number of soft-deleted offsets.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len() as usize
    }

    /// Last applied mutation sequence number for an offset.
    #[must_use]
    pub fn version(&self, offset: PointOffset) -> Option<SeqNumber> {
        self.versions.get(offset as usize).copied().flatten()
    }

    /// Records the sequence number of the mutation just applied.
    pub fn set_version(&mut self, offset: PointOffset, seq: SeqNumber) {
        if let Some(slot) = self.versions.get_mut(offset as usize) {
            *slot = Some(seq);
        }
    }

    /// Verifies that the forward/reverse mapping is a bijection restricted
    /// to live offsets.
    ///
    /// # Errors
    ///
    /// Returns the unrecoverable invariant-violation error on breakage;
    /// the segment must be abandoned, not repaired.
    pub fn check_integrity(&self) -> Result<()> {
        for (id, offset) in self.iter_live() {
            if self.deleted.contains(offset) {
                return Err(Error::InvariantViolation(format!(
                    "id {id} resolves to deleted offset {offset}"
                )));
            }
            match self.offset_to_id.get(offset as usize).copied().flatten() {
                Some(back) if back == id => {}
                other => {
                    return Err(Error::InvariantViolation(format!(
                        "offset {offset} translates to {other:?}, expected {id}"
                    )));
                }
            }
        }
        let live = self.live_count() as u64 + self.deleted.len();
        if live != self.offset_to_id.len() as u64 {
            return Err(Error::InvariantViolation(format!(
                "{} live + {} deleted != {} allocated",
                self.live_count(),
                self.deleted.len(),
                self.offset_to_id.len()
            )));
        }
        Ok(())
    }

    /// Persists the tracker state, atomically with respect to readers of
    /// the snapshot path (temp file + rename).
    pub fn save(&self, dir: &Path) -> Result<()> {
        let snapshot = TrackerSnapshot {
            num_to_offset: self.num_to_offset.clone(),
            uuid_to_offset: self.uuid_to_offset.clone(),
            deleted: self.deleted.clone(),
            versions: self.versions.clone(),
            slots: self.offset_to_id.len() as u32,
        };

        let final_path = dir.join(TRACKER_FILE);
        let tmp_path = dir.join(format!("{TRACKER_FILE}.tmp"));
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(SNAPSHOT_MAGIC)?;
            writer.write_all(&[SNAPSHOT_VERSION])?;
            bincode::serialize_into(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &final_path)?;
        debug!(
            live = self.live_count(),
            deleted = self.deleted_count(),
            "id tracker snapshot written"
        );
        Ok(())
    }

    /// Loads tracker state written by [`IdTracker::save`].
    pub fn load(dir: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(dir.join(TRACKER_FILE))?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(Error::Serialization(
                "bad id tracker snapshot magic".to_string(),
            ));
        }
        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported id tracker snapshot version {}",
                version[0]
            )));
        }

        let snapshot: TrackerSnapshot = bincode::deserialize_from(&mut reader)?;

        let mut offset_to_id = vec![None; snapshot.slots as usize];
        for (&n, &o) in &snapshot.num_to_offset {
            offset_to_id[o as usize] = Some(PointId::Num(n));
        }
        for (&u, &o) in &snapshot.uuid_to_offset {
            offset_to_id[o as usize] = Some(PointId::Uuid(u));
        }

        let tracker = Self {
            num_to_offset: snapshot.num_to_offset,
            uuid_to_offset: snapshot.uuid_to_offset,
            offset_to_id,
            deleted: snapshot.deleted,
            versions: snapshot.versions,
        };
        tracker.check_integrity()?;
        Ok(tracker)
    }
}
