//! Error types for `StrataDB`.
//!
//! A single unified error type covers every segment operation. Lookup-style
//! absence is deliberately *not* represented here: `resolve`, `translate`
//! and payload `get` return `Option`/empty values, because "not found" is a
//! normal outcome on those paths, not a fault.

use crate::point::{PointId, PointOffset};
use thiserror::Error;

/// Result type alias for `StrataDB` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in segment operations.
///
/// Error codes follow the pattern `STRATA-NNN` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector length disagrees with the storage's configured dimension
    /// (STRATA-001). Fatal to the single operation, never to the segment.
    #[error("[STRATA-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the storage was created with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// No live vector is stored at the given offset (STRATA-002).
    #[error("[STRATA-002] No vector stored at offset {0}")]
    VectorNotFound(PointOffset),

    /// An update-only operation addressed an identifier this segment has
    /// never seen (STRATA-003). Distinct from benign absence: it signals a
    /// caller-logic mismatch, the caller expected an existing record.
    #[error("[STRATA-003] Point {0} does not exist, update requires an existing point")]
    MissingPoint(PointId),

    /// Non-zero status from the Basalt engine boundary (STRATA-004).
    /// Propagated unchanged; retry policy belongs to the caller.
    #[error("[STRATA-004] Engine call '{call}' failed with status {status}")]
    Engine {
        /// Name of the foreign call that failed.
        call: &'static str,
        /// Raw status code returned by the engine.
        status: i32,
    },

    /// Bijection breakage detected in the ID tracker (STRATA-005).
    /// Must never occur in correct operation; the segment should be
    /// abandoned, not repaired.
    #[error("[STRATA-005] Mapping invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid segment or store configuration (STRATA-006), including
    /// unknown driver or index names.
    #[error("[STRATA-006] Configuration error: {0}")]
    Config(String),

    /// Storage-level failure outside the taxonomy above (STRATA-007).
    #[error("[STRATA-007] Storage error: {0}")]
    Storage(String),

    /// IO error (STRATA-008).
    #[error("[STRATA-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (STRATA-009).
    #[error("[STRATA-009] Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the stable error code (e.g. "STRATA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "STRATA-001",
            Self::VectorNotFound(_) => "STRATA-002",
            Self::MissingPoint(_) => "STRATA-003",
            Self::Engine { .. } => "STRATA-004",
            Self::InvariantViolation(_) => "STRATA-005",
            Self::Config(_) => "STRATA-006",
            Self::Storage(_) => "STRATA-007",
            Self::Io(_) => "STRATA-008",
            Self::Serialization(_) => "STRATA-009",
        }
    }

    /// Returns true if this error is recoverable from the caller's side.
    ///
    /// An invariant violation means the segment's mappings can no longer be
    /// trusted; everything else is scoped to the failing operation.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
