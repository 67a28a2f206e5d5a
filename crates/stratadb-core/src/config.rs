//! `StrataDB` configuration.
//!
//! Two layers of configuration exist:
//!
//! 1. [`StoreConfig`] — process-wide tunables, merged from defaults, a
//!    `stratadb.toml` file and `STRATADB_*` environment variables.
//! 2. [`SegmentConfig`] — per-segment parameters (dimension, metric, named
//!    backend drivers), persisted as `segment.json` in the segment
//!    directory and validated against the closed driver registry before
//!    any segment is constructed.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`STRATADB_*`)
//! 2. Configuration file (`stratadb.toml`)
//! 3. Default values

use crate::distance::DistanceMetric;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the persisted per-segment configuration.
pub const SEGMENT_CONFIG_FILE: &str = "segment.json";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse a configuration source.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// A driver or index name that is not in the build-time registry.
    #[error("Unknown {kind} '{name}', expected one of: {known}")]
    UnknownName {
        /// What was being looked up ("vector storage driver", ...).
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// Comma-separated registry contents.
        known: String,
    },

    /// A backend that exists in the registry but was not compiled in.
    #[error("{kind} '{name}' requires the '{feature}' feature")]
    Unavailable {
        /// What was being configured.
        kind: &'static str,
        /// The requested name.
        name: &'static str,
        /// Cargo feature that would enable it.
        feature: &'static str,
    },

    /// IO error while reading or writing configuration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Vector storage backend selector.
///
/// The set of backends is closed at build time; configuration names map
/// onto it through [`VectorStorageKind::from_name`] and unknown names fail
/// validation before any segment is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStorageKind {
    /// Volatile in-process storage.
    Memory,
    /// Memory-mapped file storage.
    Mmap,
    /// Basalt external persistent engine.
    Basalt,
}

impl VectorStorageKind {
    const REGISTRY: &'static [(&'static str, Self)] = &[
        ("memory", Self::Memory),
        ("mmap", Self::Mmap),
        ("basalt", Self::Basalt),
    ];

    /// Resolves a configuration name against the registry.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        lookup(Self::REGISTRY, name, "vector storage driver")
    }

    /// The registry name of this backend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Mmap => "mmap",
            Self::Basalt => "basalt",
        }
    }

    /// True if the backend survives process restarts.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Memory)
    }

    const fn feature_gate(self) -> Option<&'static str> {
        match self {
            Self::Memory => None,
            Self::Mmap => {
                if cfg!(feature = "persistence") {
                    None
                } else {
                    Some("persistence")
                }
            }
            Self::Basalt => {
                if cfg!(feature = "external-engine") {
                    None
                } else {
                    Some("external-engine")
                }
            }
        }
    }
}

/// Payload storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStorageKind {
    /// In-process document map.
    Memory,
    /// Basalt external persistent engine, with a write-through cache.
    Basalt,
}

impl PayloadStorageKind {
    const REGISTRY: &'static [(&'static str, Self)] =
        &[("memory", Self::Memory), ("basalt", Self::Basalt)];

    /// Resolves a configuration name against the registry.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        lookup(Self::REGISTRY, name, "payload storage driver")
    }

    /// The registry name of this backend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Basalt => "basalt",
        }
    }

    const fn feature_gate(self) -> Option<&'static str> {
        match self {
            Self::Memory => None,
            Self::Basalt => {
                if cfg!(feature = "external-engine") {
                    None
                } else {
                    Some("external-engine")
                }
            }
        }
    }
}

/// Vector index selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exact brute-force scan.
    Flat,
    /// In-process HNSW graph.
    Hnsw,
    /// Basalt's external graph index.
    Basalt,
}

impl IndexKind {
    const REGISTRY: &'static [(&'static str, Self)] = &[
        ("flat", Self::Flat),
        ("hnsw", Self::Hnsw),
        ("basalt", Self::Basalt),
    ];

    /// Resolves a configuration name against the registry.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        lookup(Self::REGISTRY, name, "index type")
    }

    /// The registry name of this index.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Hnsw => "hnsw",
            Self::Basalt => "basalt",
        }
    }

    const fn feature_gate(self) -> Option<&'static str> {
        match self {
            Self::Flat | Self::Hnsw => None,
            Self::Basalt => {
                if cfg!(feature = "external-engine") {
                    None
                } else {
                    Some("external-engine")
                }
            }
        }
    }
}

fn lookup<T: Copy>(
    registry: &'static [(&'static str, T)],
    name: &str,
    kind: &'static str,
) -> Result<T, ConfigError> {
    registry
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
        .ok_or_else(|| ConfigError::UnknownName {
            kind,
            name: name.to_string(),
            known: registry
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// HNSW graph parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswParams {
    /// Connections per node above layer 0 (layer 0 uses twice this).
    pub m: usize,
    /// Candidate pool size during construction.
    pub ef_construction: usize,
    /// Candidate pool size during search.
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 128,
            ef_search: 128,
        }
    }
}

/// Process-wide store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory for segment data.
    pub data_dir: String,
    /// Default HNSW parameters for new segments.
    pub hnsw: HnswParams,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./strata_data".to_string(),
            hnsw: HnswParams::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from defaults, `stratadb.toml` (or an explicit
    /// path) and `STRATADB_*` environment variables, in ascending priority.
    ///
    /// Nested keys use double underscores in the environment:
    /// `STRATADB_HNSW__EF_SEARCH=256`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let toml_path = path.unwrap_or_else(|| Path::new("stratadb.toml"));
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(toml_path))
            .merge(Env::prefixed("STRATADB_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates tunables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hnsw(&self.hnsw)
    }
}

fn validate_hnsw(hnsw: &HnswParams) -> Result<(), ConfigError> {
    if hnsw.m < 2 {
        return Err(ConfigError::InvalidValue {
            key: "hnsw.m".to_string(),
            message: format!("must be at least 2, got {}", hnsw.m),
        });
    }
    if hnsw.ef_construction < hnsw.m {
        return Err(ConfigError::InvalidValue {
            key: "hnsw.ef_construction".to_string(),
            message: format!(
                "must be at least m ({}), got {}",
                hnsw.m, hnsw.ef_construction
            ),
        });
    }
    if hnsw.ef_search == 0 {
        return Err(ConfigError::InvalidValue {
            key: "hnsw.ef_search".to_string(),
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}

/// Per-segment configuration, fixed at segment creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Segment (collection) name.
    pub name: String,
    /// Vector dimension, fixed for the segment's lifetime.
    pub dimension: usize,
    /// Distance metric used for scoring and result ordering.
    pub metric: DistanceMetric,
    /// Vector storage backend.
    pub vector_storage: VectorStorageKind,
    /// Payload storage backend.
    pub payload_storage: PayloadStorageKind,
    /// Vector index.
    pub index: IndexKind,
    /// HNSW parameters (ignored by non-graph indexes).
    #[serde(default)]
    pub hnsw: HnswParams,
}

impl SegmentConfig {
    /// Validates the configuration against the driver registry and the
    /// compiled feature set. Runs before any segment is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "dimension".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if let Some(feature) = self.vector_storage.feature_gate() {
            return Err(ConfigError::Unavailable {
                kind: "vector storage driver",
                name: self.vector_storage.name(),
                feature,
            });
        }
        if let Some(feature) = self.payload_storage.feature_gate() {
            return Err(ConfigError::Unavailable {
                kind: "payload storage driver",
                name: self.payload_storage.name(),
                feature,
            });
        }
        if let Some(feature) = self.index.feature_gate() {
            return Err(ConfigError::Unavailable {
                kind: "index type",
                name: self.index.name(),
                feature,
            });
        }
        validate_hnsw(&self.hnsw)
    }

    /// Persists the configuration as `segment.json` in the segment
    /// directory.
    pub fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(dir.join(SEGMENT_CONFIG_FILE), json)?;
        Ok(())
    }

    /// Loads a previously persisted configuration from a segment directory.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(dir.join(SEGMENT_CONFIG_FILE))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
