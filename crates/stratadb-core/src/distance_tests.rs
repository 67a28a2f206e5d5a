//! Tests for `distance` module

use super::distance::*;
use std::cmp::Ordering;

#[test]
fn test_cosine_similarity() {
    let a = vec![1.0, 0.0, 0.0];
    let b = vec![1.0, 0.0, 0.0];
    let similarity = DistanceMetric::Cosine.score(&a, &b);
    assert!((similarity - 1.0).abs() < 1e-6);

    let c = vec![0.0, 1.0, 0.0];
    let similarity = DistanceMetric::Cosine.score(&a, &c);
    assert!(similarity.abs() < 1e-6);
}

#[test]
fn test_cosine_zero_vector_is_zero() {
    let a = vec![0.0, 0.0];
    let b = vec![1.0, 1.0];
    assert_eq!(DistanceMetric::Cosine.score(&a, &b), 0.0);
}

#[test]
fn test_euclidean_distance() {
    let a = vec![0.0, 0.0, 0.0];
    let b = vec![3.0, 4.0, 0.0];
    let distance = DistanceMetric::Euclidean.score(&a, &b);
    assert!((distance - 5.0).abs() < 1e-6);
}

#[test]
fn test_dot_product() {
    let a = vec![1.0, 2.0, 3.0];
    let b = vec![4.0, 5.0, 6.0];
    let product = DistanceMetric::Dot.score(&a, &b);
    assert!((product - 32.0).abs() < 1e-6);
}

#[test]
fn test_manhattan_distance() {
    let a = vec![1.0, 2.0];
    let b = vec![4.0, -2.0];
    let distance = DistanceMetric::Manhattan.score(&a, &b);
    assert!((distance - 7.0).abs() < 1e-6);
}

#[test]
fn test_higher_is_better() {
    assert!(DistanceMetric::Cosine.higher_is_better());
    assert!(DistanceMetric::Dot.higher_is_better());
    assert!(!DistanceMetric::Euclidean.higher_is_better());
    assert!(!DistanceMetric::Manhattan.higher_is_better());
}

#[test]
fn test_cmp_scores_orders_best_first() {
    // Similarity: higher first.
    assert_eq!(DistanceMetric::Cosine.cmp_scores(0.9, 0.5), Ordering::Less);
    // Distance: lower first.
    assert_eq!(
        DistanceMetric::Euclidean.cmp_scores(0.5, 0.9),
        Ordering::Less
    );
}

#[test]
fn test_distance_is_uniformly_lower_better() {
    let a = vec![1.0, 0.0];
    let near = vec![0.9, 0.1];
    let far = vec![0.0, 1.0];
    for metric in [
        DistanceMetric::Cosine,
        DistanceMetric::Euclidean,
        DistanceMetric::Dot,
        DistanceMetric::Manhattan,
    ] {
        assert!(
            metric.distance(&a, &near) < metric.distance(&a, &far),
            "metric {metric:?} should rank the nearer vector lower"
        );
    }
}

#[test]
fn test_engine_names() {
    assert_eq!(DistanceMetric::Cosine.engine_name(), "cosine");
    assert_eq!(DistanceMetric::Euclidean.engine_name(), "euclidean");
    assert_eq!(DistanceMetric::Dot.engine_name(), "dot");
    assert_eq!(DistanceMetric::Manhattan.engine_name(), "manhattan");
}

#[test]
fn test_metric_serialization() {
    for metric in [
        DistanceMetric::Cosine,
        DistanceMetric::Euclidean,
        DistanceMetric::Dot,
        DistanceMetric::Manhattan,
    ] {
        let json = serde_json::to_string(&metric).unwrap();
        let back: DistanceMetric = serde_json::from_str(&json).unwrap();
        assert_eq!(metric, back);
    }
}
