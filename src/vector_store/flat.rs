//! Exact brute-force vector index.

use super::{squared_l2, Neighbor, VectorIndex};
use crate::error::{GlimtError, Result};

/// Flat index storing vectors contiguously, one row per insertion.
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty flat index.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn row(&self, id: usize) -> &[f32] {
        &self.data[id * self.dimension..(id + 1) * self.dimension]
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        // Validate the whole batch before touching storage.
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(GlimtError::VectorIndex(format!(
                "Invalid dimension: expected {}, got {}",
                self.dimension,
                bad.len()
            )));
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
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

        let mut results: Vec<Neighbor> = (0..self.len())
            .map(|id| Neighbor {
                id,
                distance: squared_l2(query, self.row(id)),
            })
            .collect();

        // Ties keep insertion order.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn reset(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_index() {
        let mut index = FlatIndex::new(3);

        index
            .add(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]])
            .unwrap();
        index.add(&[vec![0.9, 0.1, 0.0]]).unwrap();

        assert_eq!(index.len(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, 0);
        assert_eq!(results[1].id, 2);
        assert_eq!(results[2].id, 1);
        assert!(results[0].distance < results[1].distance);
    }

    #[test]
    fn test_dimension_validation() {
        let mut index = FlatIndex::new(3);
        assert!(index.add(&[vec![1.0, 0.0, 0.0], vec![1.0]]).is_err());
        // A rejected batch leaves the index unchanged.
        assert_eq!(index.len(), 0);
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_reset() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![1.0, 0.0]]).unwrap();
        index.reset();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }
}
