//! Distance metrics for vector similarity calculations.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Distance metric for vector similarity calculations.
///
/// Cosine and dot product are similarity metrics (higher is better);
/// Euclidean and Manhattan are distances (lower is better). All ordering in
/// search results follows [`DistanceMetric::cmp_scores`], which is
/// consistent per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity. Best for normalized embeddings.
    Cosine,
    /// Euclidean distance (L2 norm).
    Euclidean,
    /// Dot product (inner product).
    Dot,
    /// Manhattan distance (L1 norm).
    Manhattan,
}

impl DistanceMetric {
    /// Scores a pair of vectors under this metric.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different dimensions; callers validate
    /// dimensions at the storage boundary before any scoring happens.
    #[must_use]
    #[inline]
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "vectors must have equal dimension");
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => euclidean_distance(a, b),
            Self::Dot => dot_product(a, b),
            Self::Manhattan => manhattan_distance(a, b),
        }
    }

    /// Returns whether higher scores indicate more similarity.
    #[must_use]
    pub const fn higher_is_better(&self) -> bool {
        matches!(self, Self::Cosine | Self::Dot)
    }

    /// Orders two scores best-first under this metric.
    ///
    /// NaN scores sort last via `total_cmp`, so a degenerate vector can
    /// never displace real hits.
    #[must_use]
    pub fn cmp_scores(&self, a: f32, b: f32) -> Ordering {
        if self.higher_is_better() {
            b.total_cmp(&a)
        } else {
            a.total_cmp(&b)
        }
    }

    /// The name the Basalt engine uses for this metric in its collection
    /// configuration block.
    #[must_use]
    pub const fn engine_name(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dot => "dot",
            Self::Manhattan => "manhattan",
        }
    }

    /// Converts a score into a distance-like value where lower is always
    /// better. Used by graph traversal, which minimizes uniformly.
    #[must_use]
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let score = self.score(a, b);
        if self.higher_is_better() {
            -score
        } else {
            score
        }
    }
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[inline]
fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
