//! Approximate vector index backed by an HNSW graph.

use super::{Neighbor, VectorIndex};
use crate::error::{GlimtError, Result};
use hnsw_rs::prelude::*;

/// Connections per node.
const MAX_NB_CONNECTION: usize = 32;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
/// Lower bound on the search beam; raised to `k` for larger queries.
const EF_SEARCH: usize = 64;
/// Capacity hint used to size the layer distribution.
const INITIAL_CAPACITY: usize = 10_000;

/// HNSW index over L2 distance.
///
/// Unit-normalized inputs make the ranking equivalent to cosine similarity.
pub struct HnswIndex {
    graph: Hnsw<'static, f32, DistL2>,
    dimension: usize,
    count: usize,
}

impl HnswIndex {
    /// Create an empty HNSW index.
    pub fn new(dimension: usize) -> Self {
        Self {
            graph: Self::empty_graph(),
            dimension,
            count: 0,
        }
    }

    fn empty_graph() -> Hnsw<'static, f32, DistL2> {
        Hnsw::<f32, DistL2>::new(
            MAX_NB_CONNECTION,
            INITIAL_CAPACITY,
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistL2 {},
        )
    }
}

impl VectorIndex for HnswIndex {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(GlimtError::VectorIndex(format!(
                "Invalid dimension: expected {}, got {}",
                self.dimension,
                bad.len()
            )));
        }

        for vector in vectors {
            self.graph.insert((vector, self.count));
            self.count += 1;
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(GlimtError::VectorIndex(format!(
                "Invalid query dimension: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }
        if k == 0 || self.count == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<Neighbor> = self
            .graph
            .search(query, k, EF_SEARCH.max(k))
            .into_iter()
            .map(|n| Neighbor {
                id: n.d_id,
                // DistL2 is the Euclidean distance; report it squared like the flat index.
                distance: n.distance * n.distance,
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn reset(&mut self) {
        self.graph = Self::empty_graph();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::l2_normalize;

    fn unit(values: &[f32]) -> Vec<f32> {
        let mut v = values.to_vec();
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn test_insert_and_search() {
        let mut index = HnswIndex::new(3);
        index
            .add(&[unit(&[1.0, 0.0, 0.0]), unit(&[0.0, 1.0, 0.0]), unit(&[0.9, 0.1, 0.0])])
            .unwrap();

        assert_eq!(index.len(), 3);

        let results = index.search(&unit(&[1.0, 0.0, 0.0]), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 0);
        assert_eq!(results[1].id, 2);
        assert!(results[0].distance < 1e-5);
    }

    #[test]
    fn test_ids_continue_across_batches() {
        let mut index = HnswIndex::new(2);
        index.add(&[unit(&[1.0, 0.0])]).unwrap();
        index.add(&[unit(&[0.0, 1.0])]).unwrap();

        let results = index.search(&unit(&[0.0, 1.0]), 1).unwrap();
        assert_eq!(results[0].id, 1);
    }

    #[test]
    fn test_reset_empties_graph() {
        let mut index = HnswIndex::new(2);
        index.add(&[unit(&[1.0, 0.0])]).unwrap();
        index.reset();
        assert!(index.is_empty());
        assert!(index.search(&unit(&[1.0, 0.0]), 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_validation() {
        let mut index = HnswIndex::new(384);
        assert!(index.add(&[vec![1.0; 128]]).is_err());
        assert!(index.search(&[1.0; 128], 1).is_err());
    }
}
