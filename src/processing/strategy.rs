//! Interchangeable ranking strategies behind one interface.

use crate::domain::corpus::Corpus;
use crate::models::config::StrategyKind;
use crate::processing::embedding::{TextEncoder, normalize_embedding};
use crate::processing::index::{FlatIndex, Hit, IndexError, SimilarityIndex, SparseIndex};
use crate::processing::lexical::{SparseVector, TfidfVectorizer};
use crate::processing::normalizer::normalize;
use crate::processing::recommender::RecommendError;
use crate::repository::EmbeddingSnapshot;

/// A query projected into the strategy's vector space.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryVector {
    Sparse(SparseVector),
    Dense(Vec<f32>),
}

/// TF-IDF over normalized descriptions, searched by brute-force cosine.
pub struct LexicalStrategy {
    vectorizer: TfidfVectorizer,
    index: SparseIndex,
}

impl LexicalStrategy {
    pub fn fit(corpus: &Corpus) -> Self {
        let texts: Vec<String> = corpus.descriptions().map(normalize).collect();
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(&texts);

        log::info!(
            "Built lexical index: {} items, {} terms",
            matrix.len(),
            vectorizer.dimensions()
        );

        Self {
            vectorizer,
            index: SparseIndex::build(matrix),
        }
    }
}

/// Precomputed sentence embeddings searched with an exact flat index.
pub struct EmbeddingStrategy {
    encoder: Box<dyn TextEncoder>,
    index: FlatIndex,
}

impl EmbeddingStrategy {
    /// Wraps a persisted embedding snapshot that must cover `corpus` row for row.
    pub fn load(
        corpus: &Corpus,
        snapshot: &EmbeddingSnapshot,
        encoder: Box<dyn TextEncoder>,
    ) -> Result<Self, RecommendError> {
        if snapshot.meta.rows != corpus.len() {
            return Err(IndexError::RowCountMismatch {
                index: snapshot.meta.rows,
                corpus: corpus.len(),
            }
            .into());
        }
        if snapshot.meta.model != encoder.model_name() {
            log::warn!(
                "Embeddings were built with {} but queries use {}",
                snapshot.meta.model,
                encoder.model_name()
            );
        }

        let index = FlatIndex::build(snapshot.meta.dimensions, snapshot.rows())?;
        log::info!(
            "Built embedding index: {} items, {} dimensions",
            index.len(),
            index.dimensions()
        );

        Ok(Self { encoder, index })
    }
}

/// Ranking strategy selected by configuration.
pub enum Strategy {
    Lexical(LexicalStrategy),
    Embedding(EmbeddingStrategy),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Lexical(_) => StrategyKind::Lexical,
            Strategy::Embedding(_) => StrategyKind::Embedding,
        }
    }

    /// Normalizes and vectorizes for the lexical strategy; the embedding
    /// strategy hands the raw query to the encoder.
    pub fn encode_query(&self, query: &str) -> Result<QueryVector, RecommendError> {
        match self {
            Strategy::Lexical(lexical) => Ok(QueryVector::Sparse(
                lexical.vectorizer.transform(&normalize(query)),
            )),
            Strategy::Embedding(embedding) => {
                let vector = embedding
                    .encoder
                    .encode(&[query.to_string()])?
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                Ok(QueryVector::Dense(normalize_embedding(&vector)))
            }
        }
    }

    pub fn search(&self, query: &QueryVector, k: usize) -> Result<Vec<Hit>, RecommendError> {
        let hits = match (self, query) {
            (Strategy::Lexical(lexical), QueryVector::Sparse(vector)) => {
                lexical.index.search(vector, k)?
            }
            (Strategy::Embedding(embedding), QueryVector::Dense(vector)) => {
                embedding.index.search(vector, k)?
            }
            _ => return Err(RecommendError::QueryKind(self.kind())),
        };
        Ok(hits)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        match self {
            Strategy::Lexical(lexical) => lexical.index.len(),
            Strategy::Embedding(embedding) => embedding.index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
