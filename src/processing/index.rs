//! Exhaustive similarity indexes over corpus vectors.

use thiserror::Error;

use crate::processing::lexical::SparseVector;

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index holds {index} rows but the corpus has {corpus} items")]
    RowCountMismatch { index: usize, corpus: usize },
}

/// A corpus position paired with its similarity to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub position: usize,
    pub score: f32,
}

/// Read-only nearest-neighbor search over one vector per corpus item.
pub trait SimilarityIndex: Send + Sync {
    type Query: ?Sized;

    /// Returns at most `k` hits by descending score; ties keep corpus order.
    fn search(&self, query: &Self::Query, k: usize) -> Result<Vec<Hit>, IndexError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps the `k` best scores, ordered by descending score then ascending
/// position.
pub(crate) fn top_k(scores: impl Iterator<Item = f32>, k: usize) -> Vec<Hit> {
    if k == 0 {
        return Vec::new();
    }

    let mut hits: Vec<Hit> = scores
        .enumerate()
        .map(|(position, score)| Hit { position, score })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.position.cmp(&b.position))
    });
    hits.truncate(k);
    hits
}

/// Dense row-major matrix searched by inner product.
///
/// Rows are expected to be L2-normalized so the inner product equals cosine
/// similarity.
#[derive(Clone, Debug, Default)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<f32>,
    rows: usize,
}

impl FlatIndex {
    pub fn build<'a, I>(dimensions: usize, rows: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut vectors = Vec::new();
        let mut count = 0;
        for row in rows {
            if row.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    actual: row.len(),
                });
            }
            vectors.extend_from_slice(row);
            count += 1;
        }

        Ok(Self {
            dimensions,
            vectors,
            rows: count,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl SimilarityIndex for FlatIndex {
    type Query = [f32];

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if self.rows == 0 {
            return Ok(Vec::new());
        }

        let scores = self
            .vectors
            .chunks_exact(self.dimensions.max(1))
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>());

        Ok(top_k(scores, k))
    }

    fn len(&self) -> usize {
        self.rows
    }
}

/// Corpus x vocabulary TF-IDF matrix stored as sparse rows.
#[derive(Clone, Debug, Default)]
pub struct SparseIndex {
    rows: Vec<SparseVector>,
}

impl SparseIndex {
    pub fn build(rows: Vec<SparseVector>) -> Self {
        Self { rows }
    }
}

impl SimilarityIndex for SparseIndex {
    type Query = SparseVector;

    fn search(&self, query: &SparseVector, k: usize) -> Result<Vec<Hit>, IndexError> {
        Ok(top_k(self.rows.iter().map(|row| row.cosine(query)), k))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
