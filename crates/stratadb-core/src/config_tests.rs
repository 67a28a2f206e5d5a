//! Tests for `config` module

use super::config::*;
use super::distance::DistanceMetric;

fn memory_config() -> SegmentConfig {
    SegmentConfig {
        name: "test".to_string(),
        dimension: 4,
        metric: DistanceMetric::Cosine,
        vector_storage: VectorStorageKind::Memory,
        payload_storage: PayloadStorageKind::Memory,
        index: IndexKind::Flat,
        hnsw: HnswParams::default(),
    }
}

#[test]
fn test_registry_resolves_known_names() {
    assert_eq!(
        VectorStorageKind::from_name("memory").unwrap(),
        VectorStorageKind::Memory
    );
    assert_eq!(
        VectorStorageKind::from_name("mmap").unwrap(),
        VectorStorageKind::Mmap
    );
    assert_eq!(
        PayloadStorageKind::from_name("basalt").unwrap(),
        PayloadStorageKind::Basalt
    );
    assert_eq!(IndexKind::from_name("hnsw").unwrap(), IndexKind::Hnsw);
}

#[test]
fn test_registry_rejects_unknown_names() {
    let err = VectorStorageKind::from_name("rocksdb").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("rocksdb"));
    assert!(message.contains("memory"));

    assert!(IndexKind::from_name("ivf").is_err());
    assert!(PayloadStorageKind::from_name("").is_err());
}

#[test]
fn test_names_roundtrip_through_registry() {
    for kind in [
        VectorStorageKind::Memory,
        VectorStorageKind::Mmap,
        VectorStorageKind::Basalt,
    ] {
        assert_eq!(VectorStorageKind::from_name(kind.name()).unwrap(), kind);
    }
}

#[test]
fn test_zero_dimension_fails_validation() {
    let mut config = memory_config();
    config.dimension = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_hnsw_params_validation() {
    let mut config = memory_config();
    config.hnsw.m = 1;
    assert!(config.validate().is_err());

    let mut config = memory_config();
    config.hnsw.ef_construction = 4;
    config.hnsw.m = 16;
    assert!(config.validate().is_err());

    let mut config = memory_config();
    config.hnsw.ef_search = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_segment_config_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = memory_config();
    config.save(dir.path()).unwrap();

    let loaded = SegmentConfig::load(dir.path()).unwrap();
    assert_eq!(loaded.name, "test");
    assert_eq!(loaded.dimension, 4);
    assert_eq!(loaded.metric, DistanceMetric::Cosine);
    assert_eq!(loaded.vector_storage, VectorStorageKind::Memory);
    assert_eq!(loaded.index, IndexKind::Flat);
}

#[test]
fn test_store_config_defaults() {
    let config = StoreConfig::default();
    assert_eq!(config.data_dir, "./strata_data");
    assert_eq!(config.hnsw.m, 16);
    config.validate().unwrap();
}

#[test]
fn test_store_config_loads_toml_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("stratadb.toml");
    std::fs::write(
        &toml_path,
        "data_dir = \"/tmp/elsewhere\"\n\n[hnsw]\nef_search = 256\n",
    )
    .unwrap();

    let config = StoreConfig::load(Some(&toml_path)).unwrap();
    assert_eq!(config.data_dir, "/tmp/elsewhere");
    assert_eq!(config.hnsw.ef_search, 256);
    // Untouched keys keep their defaults.
    assert_eq!(config.hnsw.m, 16);
}

#[test]
fn test_store_config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.data_dir, "./strata_data");
}

#[cfg(not(feature = "external-engine"))]
#[test]
fn test_basalt_backends_require_feature() {
    let mut config = memory_config();
    config.vector_storage = VectorStorageKind::Basalt;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("external-engine"));
}
