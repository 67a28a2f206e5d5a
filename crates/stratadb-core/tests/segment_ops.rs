//! End-to-end segment behavior over the in-process backends.

use serde_json::json;
use stratadb_core::{
    Condition, DistanceMetric, Error, Filter, HnswParams, IndexKind, Payload, PayloadStorageKind,
    PointId, Segment, SegmentConfig, VectorStorageKind,
};
use uuid::Uuid;

fn config(name: &str, index: IndexKind) -> SegmentConfig {
    SegmentConfig {
        name: name.to_string(),
        dimension: 4,
        metric: DistanceMetric::Cosine,
        vector_storage: VectorStorageKind::Memory,
        payload_storage: PayloadStorageKind::Memory,
        index,
        hnsw: HnswParams {
            m: 8,
            ef_construction: 64,
            ef_search: 64,
        },
    }
}

fn flat_segment(dir: &tempfile::TempDir) -> Segment {
    Segment::create(dir.path().join("seg"), config("seg", IndexKind::Flat)).unwrap()
}

fn payload(pairs: &[(&str, serde_json::Value)]) -> Payload {
    let mut doc = Payload::new();
    for (key, value) in pairs {
        doc.insert(*key, value.clone());
    }
    doc
}

#[test]
fn upsert_search_delete_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);

    segment
        .upsert_point(1, PointId::Num(1), &[1.0, 0.0, 0.0, 0.0], None)
        .unwrap();
    segment
        .upsert_point(2, PointId::Num(2), &[0.0, 1.0, 0.0, 0.0], None)
        .unwrap();
    assert_eq!(segment.point_count(), 2);

    let hits = segment.search(&[1.0, 0.0, 0.0, 0.0], 1, None, false).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, PointId::Num(1));
    assert!((hits[0].score - 1.0).abs() < 1e-6);

    assert!(segment.delete_point(PointId::Num(1)).unwrap());
    assert!(!segment.contains(PointId::Num(1)));

    let hits = segment.search(&[1.0, 0.0, 0.0, 0.0], 2, None, false).unwrap();
    let ids: Vec<PointId> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![PointId::Num(2)]);
}

#[test]
fn update_vectors_requires_existing_point() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);

    let u1 = PointId::Uuid(Uuid::new_v4());
    let u2 = PointId::Uuid(Uuid::new_v4());

    segment.upsert_point(1, u1, &[1.0, 0.0, 0.0, 0.0], None).unwrap();
    segment.update_vectors(2, u1, &[0.0, 0.0, 1.0, 0.0]).unwrap();
    assert_eq!(
        segment.get_vector(u1).unwrap().unwrap(),
        vec![0.0, 0.0, 1.0, 0.0]
    );

    // Never-seen id: the distinct caller-logic-mismatch error, not a
    // benign miss.
    let err = segment
        .update_vectors(3, u2, &[0.0, 1.0, 0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, Error::MissingPoint(id) if id == u2));
    assert_eq!(err.code(), "STRATA-003");

    // The same id works through upsert, which creates the record.
    segment.upsert_point(4, u2, &[0.0, 1.0, 0.0, 0.0], None).unwrap();
    assert!(segment.contains(u2));
}

#[test]
fn stale_sequence_numbers_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);
    let id = PointId::Num(10);

    assert!(segment.upsert_point(5, id, &[1.0, 0.0, 0.0, 0.0], None).unwrap());

    // Equal and older sequence numbers change nothing.
    assert!(!segment.upsert_point(5, id, &[0.0, 9.0, 0.0, 0.0], None).unwrap());
    assert!(!segment.upsert_point(4, id, &[0.0, 9.0, 0.0, 0.0], None).unwrap());
    assert!(!segment.update_vectors(5, id, &[0.0, 9.0, 0.0, 0.0]).unwrap());
    assert_eq!(
        segment.get_vector(id).unwrap().unwrap(),
        vec![1.0, 0.0, 0.0, 0.0]
    );

    // A newer sequence number applies.
    assert!(segment.upsert_point(6, id, &[0.0, 1.0, 0.0, 0.0], None).unwrap());
    assert_eq!(
        segment.get_vector(id).unwrap().unwrap(),
        vec![0.0, 1.0, 0.0, 0.0]
    );
}

#[test]
fn dimension_mismatch_fails_the_operation_not_the_segment() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);

    let err = segment
        .upsert_point(1, PointId::Num(1), &[1.0, 0.0], None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    ));
    assert_eq!(segment.point_count(), 0);

    assert!(segment.search(&[1.0], 1, None, false).is_err());

    // The segment keeps working afterwards.
    segment
        .upsert_point(2, PointId::Num(1), &[1.0, 0.0, 0.0, 0.0], None)
        .unwrap();
    assert_eq!(segment.point_count(), 1);
}

#[test]
fn filtered_search_returns_only_matching_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);

    segment
        .upsert_point(
            1,
            PointId::Num(1),
            &[1.0, 0.0, 0.0, 0.0],
            Some(&payload(&[("category", json!("tech"))])),
        )
        .unwrap();
    segment
        .upsert_point(
            2,
            PointId::Num(2),
            &[0.9, 0.1, 0.0, 0.0],
            Some(&payload(&[("category", json!("food"))])),
        )
        .unwrap();
    segment
        .upsert_point(3, PointId::Num(3), &[0.8, 0.2, 0.0, 0.0], None)
        .unwrap();

    let filter = Filter::new(Condition::eq("category", "food"));
    let hits = segment
        .search(&[1.0, 0.0, 0.0, 0.0], 3, Some(&filter), true)
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, PointId::Num(2));
    let doc = hits[0].payload.as_ref().unwrap();
    assert_eq!(doc.get("category"), Some(&json!("food")));
}

#[test]
fn payload_follows_the_point_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);
    let id = PointId::Num(7);

    segment
        .upsert_point(1, id, &[1.0, 0.0, 0.0, 0.0], Some(&payload(&[("a", json!(1))])))
        .unwrap();

    // Vector-only re-upsert leaves metadata untouched.
    segment.upsert_point(2, id, &[0.0, 1.0, 0.0, 0.0], None).unwrap();
    assert_eq!(segment.get_payload(id).unwrap().get("a"), Some(&json!(1)));

    let removed = segment.delete_payload_keys(id, &["a"]).unwrap();
    assert_eq!(removed, vec![json!(1)]);
    assert!(segment.get_payload(id).unwrap().is_empty());

    // Payload mutations on unknown points are caller-logic errors.
    let ghost = PointId::Num(1000);
    assert!(matches!(
        segment.set_payload(ghost, &payload(&[])),
        Err(Error::MissingPoint(_))
    ));

    segment.delete_point(id).unwrap();
    assert!(segment.get_payload(id).unwrap().is_empty());
}

#[test]
fn delete_unknown_point_is_a_benign_miss() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);
    assert!(!segment.delete_point(PointId::Num(12)).unwrap());
}

#[test]
fn deleted_id_gets_a_fresh_offset_on_reinsert() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);
    let id = PointId::Num(1);

    segment.upsert_point(1, id, &[1.0, 0.0, 0.0, 0.0], None).unwrap();
    segment.delete_point(id).unwrap();
    segment.upsert_point(2, id, &[0.0, 1.0, 0.0, 0.0], None).unwrap();

    let hits = segment.search(&[0.0, 1.0, 0.0, 0.0], 1, None, false).unwrap();
    assert_eq!(hits[0].id, id);
    segment.check_integrity().unwrap();
}

#[test]
fn hnsw_segment_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let segment =
        Segment::create(dir.path().join("seg"), config("seg", IndexKind::Hnsw)).unwrap();

    for n in 0..32u64 {
        let axis = (n % 4) as usize;
        let mut vector = vec![0.01 * (n / 4) as f32; 4];
        vector[axis] = 1.0;
        segment
            .upsert_point(n + 1, PointId::Num(n), &vector, None)
            .unwrap();
    }

    let hits = segment.search(&[1.0, 0.0, 0.0, 0.0], 1, None, false).unwrap();
    assert_eq!(hits[0].id, PointId::Num(0));

    segment.delete_point(PointId::Num(0)).unwrap();
    let hits = segment.search(&[1.0, 0.0, 0.0, 0.0], 8, None, false).unwrap();
    assert!(hits.iter().all(|h| h.id != PointId::Num(0)));
}

#[test]
fn build_index_swaps_in_a_fresh_structure() {
    let dir = tempfile::tempdir().unwrap();
    let segment =
        Segment::create(dir.path().join("seg"), config("seg", IndexKind::Hnsw)).unwrap();

    for n in 0..16u64 {
        let mut vector = vec![0.0; 4];
        vector[(n % 4) as usize] = 1.0;
        segment
            .upsert_point(n + 1, PointId::Num(n), &vector, None)
            .unwrap();
    }
    for n in 0..8u64 {
        segment.delete_point(PointId::Num(n)).unwrap();
    }

    segment.build_index().unwrap();

    let hits = segment.search(&[1.0, 0.0, 0.0, 0.0], 16, None, false).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| matches!(h.id, PointId::Num(n) if n >= 8)));
}

#[test]
fn mixed_id_variants_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let segment = flat_segment(&dir);
    let uuid = PointId::Uuid(Uuid::new_v4());

    segment.upsert_point(1, PointId::Num(5), &[1.0, 0.0, 0.0, 0.0], None).unwrap();
    segment.upsert_point(2, uuid, &[0.0, 1.0, 0.0, 0.0], None).unwrap();

    let hits = segment.search(&[0.0, 1.0, 0.0, 0.0], 1, None, false).unwrap();
    assert_eq!(hits[0].id, uuid);
    segment.check_integrity().unwrap();
}
