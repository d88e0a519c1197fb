//! Vector index abstraction for Glimt.
//!
//! Provides a trait-based interface over nearest-neighbour backends. Vectors are
//! addressed by insertion position: the i-th vector ever added since the last
//! `reset` has id `i`.

mod flat;
mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the matched vector.
    pub id: usize,
    /// Squared L2 distance to the query (lower is closer).
    pub distance: f32,
}

/// Index layout, chosen when the index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexTopology {
    /// Exact brute-force search.
    #[default]
    Flat,
    /// Approximate graph search (HNSW).
    Hnsw,
}

impl std::str::FromStr for IndexTopology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" | "exact" => Ok(IndexTopology::Flat),
            "hnsw" | "graph" => Ok(IndexTopology::Hnsw),
            _ => Err(format!("Unknown index topology: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexTopology::Flat => write!(f, "flat"),
            IndexTopology::Hnsw => write!(f, "hnsw"),
        }
    }
}

/// Trait for vector index implementations.
///
/// Mutation takes `&mut self`; searches are read-only and may run concurrently.
pub trait VectorIndex: Send + Sync {
    /// Append vectors. Ids continue from the current `len()`.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;

    /// Return at most `k` neighbours of `query`, ascending by distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of vectors currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension.
    fn dimension(&self) -> usize;

    /// Remove every vector.
    fn reset(&mut self);
}

/// Create an empty index with the given topology.
pub fn create_index(topology: IndexTopology, dimension: usize) -> Box<dyn VectorIndex> {
    match topology {
        IndexTopology::Flat => Box::new(FlatIndex::new(dimension)),
        IndexTopology::Hnsw => Box::new(HnswIndex::new(dimension)),
    }
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_squared_l2_on_unit_vectors_tracks_cosine() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let c = vec![-1.0, 0.0];
        // |a - b|^2 = 2 - 2cos
        assert!((squared_l2(&a, &a)).abs() < 1e-6);
        assert!((squared_l2(&a, &b) - 2.0).abs() < 1e-6);
        assert!((squared_l2(&a, &c) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_topology_parse() {
        assert_eq!("flat".parse::<IndexTopology>().unwrap(), IndexTopology::Flat);
        assert_eq!("HNSW".parse::<IndexTopology>().unwrap(), IndexTopology::Hnsw);
        assert!("ivf".parse::<IndexTopology>().is_err());
        assert_eq!(IndexTopology::Hnsw.to_string(), "hnsw");
    }

    #[test]
    fn test_both_topologies_share_ordering_contract() {
        for topology in [IndexTopology::Flat, IndexTopology::Hnsw] {
            let mut index = create_index(topology, 4);
            assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());

            let mut vectors = Vec::new();
            for i in 0..20 {
                let mut v = vec![1.0, i as f32 * 0.1, 0.0, (i % 3) as f32 * 0.05];
                l2_normalize(&mut v);
                vectors.push(v);
            }
            index.add(&vectors).unwrap();
            assert_eq!(index.len(), 20);

            for k in [0, 1, 5, 50] {
                let hits = index.search(&vectors[7], k).unwrap();
                assert!(hits.len() <= k, "{topology}: {} > {k}", hits.len());
                assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            }

            let top = index.search(&vectors[7], 1).unwrap();
            assert_eq!(top[0].id, 7, "{topology} should find the exact vector");
        }
    }
}
