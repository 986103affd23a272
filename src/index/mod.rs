// Flat vector index
// Exact nearest-neighbor search over fixed-dimension f32 vectors


use tracing::debug;

use crate::{RagError, Result};

/// Append-only exact nearest-neighbor index over fixed-dimension vectors.
///
/// Rows are stored contiguously in insertion order and addressed by their
/// integer position. There is no in-place deletion; removing vectors is done
/// by rebuilding a fresh index from the surviving rows (see
/// [`crate::retrieval::RetrievalEngine::delete`]).
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// The fixed vector dimension this index was created with.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a single vector, returning its row position.
    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(RagError::Storage(format!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    /// Append a batch of vectors in order, returning the starting row.
    ///
    /// The appended rows are contiguous: the first vector lands at the
    /// returned position, the last at `start + vectors.len() - 1`. On a
    /// dimension mismatch nothing is appended.
    #[inline]
    pub fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::Storage(format!(
                "Vector dimension mismatch in batch: expected {}, got {}",
                self.dimension,
                bad.len()
            )));
        }

        let start = self.len();
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        debug!(
            "Appended {} vectors at rows {}..{}",
            vectors.len(),
            start,
            self.len()
        );
        Ok(start)
    }

    /// Rebuild an index from a flat row-major buffer, as read back from the
    /// persisted artifact.
    #[inline]
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(RagError::CorruptState(format!(
                "Index data length {} is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { dimension, data })
    }

    /// The flat row-major vector data, for serialization.
    #[inline]
    pub fn raw_data(&self) -> &[f32] {
        &self.data
    }

    /// Get the vector stored at `row`, if the row is in bounds.
    #[inline]
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        if row >= self.len() {
            return None;
        }
        let start = row * self.dimension;
        self.data.get(start..start + self.dimension)
    }

    /// Iterate over all stored vectors in row order.
    #[inline]
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Find the `k` nearest rows to `query` by squared Euclidean distance.
    ///
    /// Results are `(row, distance)` pairs in ascending distance order.
    /// Returns fewer than `k` results when the index holds fewer rows, and
    /// an empty vec for an empty index. Squared distance preserves the
    /// ranking of true Euclidean distance.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(RagError::Storage(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows()
            .enumerate()
            .map(|(row, vector)| (row, squared_l2_distance(query, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        debug!("Search returned {} of {} rows", scored.len(), self.len());
        Ok(scored)
    }
}

fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
