//! Exact top-K similarity index over unit-normalized rows.
//!
//! Rows are stored in one contiguous row-major buffer so a search is a single
//! linear pass of dot products. Row `i` always corresponds to document
//! position `i` in the store the index was built from.

use std::cmp::Ordering;

use crate::vector::{SearchHit, VectorDimension, VectorError};

/// Dense matrix of L2-normalized vectors supporting exact inner-product search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityIndex {
    /// `None` only for the empty index
    dimension: Option<VectorDimension>,

    /// Row-major matrix data, `rows * dimension` values
    data: Vec<f32>,

    rows: usize,
}

impl SimilarityIndex {
    /// An index with no rows. Searching it always yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an index from raw feature vectors.
    ///
    /// Every row is L2-normalized on the way in. An all-zero row stays zero: it
    /// is searchable but can never score above zero.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, VectorError> {
        let Some(first) = vectors.first() else {
            return Ok(Self::empty());
        };
        let dimension = VectorDimension::new(first.len())?;

        let mut data = Vec::with_capacity(vectors.len() * dimension.get());
        for vector in &vectors {
            dimension.validate_vector(vector)?;
            let start = data.len();
            data.extend_from_slice(vector);
            l2_normalize(&mut data[start..]);
        }

        Ok(Self {
            dimension: Some(dimension),
            data,
            rows: vectors.len(),
        })
    }

    /// Reassembles an index from an already-normalized row-major buffer.
    ///
    /// Used when loading from disk; the rows are trusted to be normalized
    /// because they were written by [`SimilarityIndex::build`].
    pub(crate) fn from_raw_parts(
        dimension: VectorDimension,
        data: Vec<f32>,
    ) -> Result<Self, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::InvalidFormat(format!(
                "{} values do not divide into rows of width {dimension}",
                data.len()
            )));
        }
        let rows = data.len() / dimension.get();
        if rows == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            dimension: Some(dimension),
            data,
            rows,
        })
    }

    /// Returns up to `k` rows ranked by similarity to `query`.
    ///
    /// Results are ordered by score descending, ties broken by ascending
    /// position, so the output is fully deterministic. `k` is clamped to the
    /// number of rows. Scores are raw and unfiltered.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        dimension.validate_vector(query)?;

        let k = k.min(self.rows);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut normalized = query.to_vec();
        l2_normalize(&mut normalized);

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(dimension.get())
            .enumerate()
            .map(|(position, row)| SearchHit {
                position,
                score: dot(row, &normalized),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank_order);
            hits.truncate(k);
        }
        hits.sort_unstable_by(rank_order);

        Ok(hits)
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row width, `None` for the empty index.
    #[must_use]
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    /// The whole row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Higher scores first, then lower positions.
fn rank_order(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SimilarityIndex {
        SimilarityIndex::build(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 2.0, 0.0],
            vec![3.0, 3.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_normalizes_rows() {
        let index = sample_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimension().unwrap().get(), 3);

        let rows: Vec<&[f32]> = index.as_slice().chunks(3).collect();
        assert_eq!(rows.len(), 4);
        assert!((rows[1][1] - 1.0).abs() < 1e-6);

        let norm: f32 = rows[2].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);

        // Zero rows stay zero
        assert_eq!(rows[3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_index_is_distinct() {
        let index = SimilarityIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.dimension().is_none());
        assert_eq!(index, SimilarityIndex::empty());

        // Any query width is fine against an empty index
        assert!(index.search(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_ranks_and_clamps_k() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 10).unwrap();

        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].position, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].position, 2);
        // Positions 1 and 3 both score zero and keep ascending order
        assert_eq!(hits[2].position, 1);
        assert_eq!(hits[3].position, 3);
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = SimilarityIndex::build(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 5.0],
            vec![1.0, 0.0],
        ])
        .unwrap();

        let hits = index.search(&[0.0, 1.0], 2).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 2]);

        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn test_search_with_zero_k_and_zero_query() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());

        let hits = index.search(&[0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));

        let ragged = SimilarityIndex::build(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(ragged.is_err());

        let zero_width = SimilarityIndex::build(vec![Vec::new()]);
        assert!(matches!(
            zero_width,
            Err(VectorError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let first = sample_index();
        let second = sample_index();
        assert_eq!(first, second);

        let query = [0.3, 0.7, 0.0];
        assert_eq!(
            first.search(&query, 4).unwrap(),
            second.search(&query, 4).unwrap()
        );
    }

    #[test]
    fn test_from_raw_parts_validates_shape() {
        let dim = VectorDimension::new(2).unwrap();
        assert!(SimilarityIndex::from_raw_parts(dim, vec![1.0, 0.0, 0.0]).is_err());

        let index = SimilarityIndex::from_raw_parts(dim, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 2);

        let empty = SimilarityIndex::from_raw_parts(dim, Vec::new()).unwrap();
        assert!(empty.is_empty());
    }
}
