//! Exhaustive inner-product index.

use anyhow::{bail, Result};

/// Flat (exact, non-approximate) inner-product index.
///
/// Vectors live in one contiguous row-major buffer. Positions are
/// stable: vector `i` is the `i`-th one added, which is what ties a hit
/// back to its passage in the parallel corpus. Every search scans every
/// vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// An empty index of the given dimensionality. Searching it returns
    /// no results, which is a valid state, not an error.
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors. Always equals the corpus length in a
    /// well-formed pair.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            bail!(
                "vector has dimension {}, index expects {}",
                vector.len(),
                self.dim
            );
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Exact top-`k` by inner product: `(position, score)` in descending
    /// score order. The sort is stable, so equal scores keep insertion
    /// order. With unit-normalized vectors the score is the cosine.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            bail!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dim
            );
        }
        if self.data.is_empty() {
            return Ok(Vec::new());
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, row)| (position, dot(row, query)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    pub(crate) fn raw(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn from_raw(dim: usize, data: Vec<f32>) -> Self {
        Self { dim, data }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scale `v` to unit L2 length in place. Zero vectors stay untouched so
/// a degenerate embedding cannot turn into NaNs.
pub fn normalize_l2(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_grows_the_index() {
        let mut index = FlatIndex::new(3);
        assert!(index.is_empty());
        index.add(&[1.0, 0.0, 0.0]).unwrap();
        index.add(&[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dim(), 3);
    }

    #[test]
    fn mismatched_vector_dimension_is_rejected() {
        let mut index = FlatIndex::new(3);
        assert!(index.add(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn search_ranks_by_inner_product_descending() {
        let mut index = FlatIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        index.add(&[0.0, 1.0]).unwrap();
        index.add(&[0.6, 0.8]).unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(positions, vec![0, 2, 1]);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert!((hits[1].1 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn k_caps_the_result_count() {
        let mut index = FlatIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        index.add(&[0.0, 1.0]).unwrap();
        index.add(&[0.6, 0.8]).unwrap();

        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 3);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = FlatIndex::new(4);
        assert!(index.search(&[0.0, 0.0, 0.0, 1.0], 5).unwrap().is_empty());
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let mut index = FlatIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        index.add(&[1.0, 0.0]).unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
    }

    #[test]
    fn query_dimension_is_checked() {
        let index = FlatIndex::new(3);
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vectors_alone() {
        let mut v = vec![0.0, 0.0, 0.0];
        normalize_l2(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
