#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{RagError, Result};

/// Append-only flat vector index with exact nearest-neighbor search by
/// squared Euclidean distance. Lower distance is better; 0 is an exact match.
///
/// Positions are assigned consecutively from 0 in insertion order and never
/// change; they are the join key into the corpus metadata store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major storage, `len() * dimension` values.
    values: Vec<f32>,
}

impl FlatIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors stored.
    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            return 0;
        }
        self.values.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append vectors, assigning each the next consecutive position.
    #[inline]
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(RagError::Indexing(format!(
                    "Vector dimension mismatch: expected {}, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
            self.values.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Exact k-nearest-neighbor scan.
    ///
    /// Returns up to `k` `(position, squared_distance)` pairs in ascending
    /// distance order; ties break by ascending position, making results
    /// deterministic for the same backing data.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(RagError::Retrieval(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .values
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, squared_l2(query, row)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
