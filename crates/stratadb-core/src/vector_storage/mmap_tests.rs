//! Tests for the memory-mapped vector storage backend.

use super::{MmapVectorStorage, VectorStorageEnum};
use crate::error::Error;

fn open(dir: &std::path::Path, dimension: usize) -> VectorStorageEnum {
    VectorStorageEnum::Mmap(MmapVectorStorage::open(dir, dimension).unwrap())
}

#[test]
fn test_insert_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = open(dir.path(), 3);

    storage.insert(0, &[1.5, -2.0, 0.25]).unwrap();
    storage.insert(1, &[0.0, 9.0, 3.0]).unwrap();

    assert_eq!(storage.get(0).unwrap().as_ref(), &[1.5, -2.0, 0.25]);
    assert_eq!(storage.get(1).unwrap().as_ref(), &[0.0, 9.0, 3.0]);
    assert!(storage.is_persistent());
}

#[test]
fn test_flush_then_reopen_recovers_state() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut storage = open(dir.path(), 2);
        storage.insert(0, &[1.0, 2.0]).unwrap();
        storage.insert(1, &[3.0, 4.0]).unwrap();
        storage.insert(2, &[5.0, 6.0]).unwrap();
        storage.delete(1).unwrap();
        storage.flush().unwrap();
    }

    let reopened = open(dir.path(), 2);
    assert_eq!(reopened.total_count(), 2);
    assert_eq!(reopened.get(0).unwrap().as_ref(), &[1.0, 2.0]);
    assert!(matches!(reopened.get(1), Err(Error::VectorNotFound(1))));
    assert_eq!(reopened.get(2).unwrap().as_ref(), &[5.0, 6.0]);
}

#[test]
fn test_reopen_with_wrong_dimension_fails() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut storage = open(dir.path(), 2);
        storage.insert(0, &[1.0, 2.0]).unwrap();
        storage.flush().unwrap();
    }
    assert!(MmapVectorStorage::open(dir.path(), 8).is_err());
}

#[test]
fn test_dimension_mismatch_leaves_storage_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = open(dir.path(), 4);

    let err = storage.insert(0, &[0.0; 5]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(storage.total_count(), 0);
}

#[test]
fn test_growth_past_initial_capacity() {
    let dir = tempfile::tempdir().unwrap();
    // 256 floats per vector; an offset far out forces at least one resize
    // of the 4 MB initial file.
    let mut storage = open(dir.path(), 256);
    let vector: Vec<f32> = (0..256).map(|i| i as f32).collect();

    storage.insert(0, &vector).unwrap();
    storage.insert(9_000, &vector).unwrap();

    assert_eq!(storage.get(9_000).unwrap().as_ref(), vector.as_slice());
    assert_eq!(storage.total_count(), 2);
}

#[test]
fn test_delete_survives_reopen_without_renumbering() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut storage = open(dir.path(), 2);
        for offset in 0..5u32 {
            storage.insert(offset, &[offset as f32, 0.0]).unwrap();
        }
        storage.delete(0).unwrap();
        storage.delete(3).unwrap();
        storage.flush().unwrap();
    }

    let reopened = open(dir.path(), 2);
    assert_eq!(reopened.total_count(), 3);
    assert_eq!(reopened.get(4).unwrap().as_ref(), &[4.0, 0.0]);
    assert!(reopened.get(3).is_err());
}
