//! Stored vector records and query results.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::vector::{cosine_distance, squared_l2_distance};

/// How distance between a query and a stored vector is measured.
///
/// Both metrics are distances: smaller means more similar, and never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`, in `[0, 2]`.
    #[default]
    Cosine,
    /// Squared Euclidean distance. On unit vectors this is twice the
    /// cosine distance, so thresholds are not interchangeable.
    SquaredL2,
}

impl DistanceMetric {
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::SquaredL2 => squared_l2_distance(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::SquaredL2 => "squared_l2",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    /// Position of the chunk within the batch it was stored with.
    pub chunk_index: usize,
    /// Chunk length in characters.
    pub text_length: usize,
}

/// One stored chunk with its embedding. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub id: Uuid,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A stored chunk returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    /// The stored chunk text.
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Distance from the query under the store's metric; `>= 0`.
    pub distance: f32,
}

/// Rank stored vectors against a query embedding.
///
/// Returns at most `top_k` candidates ordered by ascending distance; equal
/// distances keep insertion order.
pub fn rank(
    vectors: &[IndexedVector],
    query: &[f32],
    top_k: usize,
    metric: DistanceMetric,
) -> Vec<Candidate> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, metric.distance(&v.embedding, query)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(i, distance)| {
            let v = &vectors[i];
            Candidate {
                id: v.id,
                document: v.chunk_text.clone(),
                metadata: v.metadata.clone(),
                distance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(text: &str, embedding: Vec<f32>) -> IndexedVector {
        IndexedVector {
            id: Uuid::new_v4(),
            chunk_text: text.to_string(),
            embedding,
            metadata: ChunkMetadata {
                source: "test.txt".to_string(),
                chunk_index: 0,
                text_length: text.chars().count(),
            },
        }
    }

    #[test]
    fn test_rank_orders_by_distance() {
        let vectors = vec![
            vector("far", vec![0.0, 1.0]),
            vector("near", vec![1.0, 0.0]),
            vector("middle", vec![1.0, 1.0]),
        ];
        let ranked = rank(&vectors, &[1.0, 0.0], 10, DistanceMetric::Cosine);
        let order: Vec<&str> = ranked.iter().map(|c| c.document.as_str()).collect();
        assert_eq!(order, vec!["near", "middle", "far"]);
        assert!(ranked[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let vectors = vec![
            vector("a", vec![1.0, 0.0]),
            vector("b", vec![0.9, 0.1]),
            vector("c", vec![0.0, 1.0]),
        ];
        assert_eq!(rank(&vectors, &[1.0, 0.0], 2, DistanceMetric::Cosine).len(), 2);
        assert!(rank(&vectors, &[1.0, 0.0], 0, DistanceMetric::Cosine).is_empty());
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let vectors = vec![
            vector("first", vec![1.0, 0.0]),
            vector("second", vec![1.0, 0.0]),
            vector("third", vec![1.0, 0.0]),
        ];
        let ranked = rank(&vectors, &[1.0, 0.0], 3, DistanceMetric::SquaredL2);
        let order: Vec<&str> = ranked.iter().map(|c| c.document.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_squared_l2_metric() {
        let vectors = vec![vector("a", vec![1.0, 2.0])];
        let ranked = rank(&vectors, &[4.0, 6.0], 1, DistanceMetric::SquaredL2);
        assert_eq!(ranked[0].distance, 25.0);
    }

    #[test]
    fn test_squared_l2_is_twice_cosine_on_unit_vectors() {
        let a = [0.6, 0.8];
        let b = [1.0, 0.0];
        let cosine = DistanceMetric::Cosine.distance(&a, &b);
        let l2 = DistanceMetric::SquaredL2.distance(&a, &b);
        assert!((cosine - 0.4).abs() < 1e-6);
        assert!((l2 - 2.0 * cosine).abs() < 1e-6);

        // A threshold of 0.6 keeps this pair under cosine but not squared L2
        assert!(cosine <= 0.6);
        assert!(l2 > 0.6);
    }

    #[test]
    fn test_metric_serde_names() {
        assert_eq!(serde_json::to_string(&DistanceMetric::SquaredL2).unwrap(), "\"squared_l2\"");
        let metric: DistanceMetric = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(metric, DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::SquaredL2.to_string(), "squared_l2");
    }
}
