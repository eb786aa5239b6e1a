//! Query-to-ranked-results orchestration over shared immutable state.

use thiserror::Error;

use crate::domain::assessment::RecommendationResult;
use crate::domain::corpus::Corpus;
use crate::models::config::{ServerConfig, StrategyKind};
use crate::processing::embedding::{EncoderError, FastEmbedEncoder};
use crate::processing::index::IndexError;
use crate::processing::strategy::{EmbeddingStrategy, LexicalStrategy, Strategy};
use crate::repository::{CatalogReader, EmbeddingReader, RepositoryError};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("index unavailable: {0}")]
    IndexUnavailable(#[from] RepositoryError),
    #[error(transparent)]
    Encoder(#[from] EncoderError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("query vector does not belong to the {0:?} strategy")]
    QueryKind(StrategyKind),
}

/// Corpus plus similarity index, built once at startup and only read after.
pub struct Recommender {
    corpus: Corpus,
    strategy: Strategy,
}

impl Recommender {
    pub fn new(corpus: Corpus, strategy: Strategy) -> Result<Self, RecommendError> {
        if strategy.len() != corpus.len() {
            return Err(IndexError::RowCountMismatch {
                index: strategy.len(),
                corpus: corpus.len(),
            }
            .into());
        }
        Ok(Self { corpus, strategy })
    }

    /// Fits the lexical strategy on `corpus`.
    pub fn lexical(corpus: Corpus) -> Self {
        let strategy = Strategy::Lexical(LexicalStrategy::fit(&corpus));
        Self { corpus, strategy }
    }

    /// Loads snapshots from `repo` and builds the configured strategy.
    ///
    /// Any failure here means the process must not start serving.
    pub fn load<R>(config: &ServerConfig, repo: &R) -> Result<Self, RecommendError>
    where
        R: CatalogReader + EmbeddingReader,
    {
        let corpus = Corpus::new(repo.list_items()?);

        match config.strategy {
            StrategyKind::Lexical => Ok(Self::lexical(corpus)),
            StrategyKind::Embedding => {
                let snapshot = repo.load_embeddings()?;
                let encoder = FastEmbedEncoder::try_new(&config.embedding_model)?;
                let strategy = EmbeddingStrategy::load(&corpus, &snapshot, Box::new(encoder))?;
                Self::new(corpus, Strategy::Embedding(strategy))
            }
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Returns up to `top_k` items by descending similarity to `query`.
    ///
    /// Blank queries yield no results. Callers are expected to clamp `top_k`;
    /// any value is tolerated and a corpus smaller than `top_k` is returned
    /// whole.
    pub fn recommend(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.strategy.encode_query(query)?;
        let hits = self.strategy.search(&vector, top_k)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.corpus.get(hit.position).map(|item| RecommendationResult {
                    position: hit.position,
                    score: hit.score,
                    item: item.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::domain::assessment::CatalogItem;
    use crate::processing::embedding::TextEncoder;
    use crate::processing::strategy::QueryVector;
    use crate::repository::EmbeddingSnapshot;

    fn corpus() -> Corpus {
        Corpus::new(vec![
            CatalogItem::new("Java Test", "measures java programming skill", "u1"),
            CatalogItem::new("Python Test", "measures python programming skill", "u2"),
            CatalogItem::new("Sales Aptitude", "measures sales negotiation ability", "u3"),
        ])
    }

    /// Encodes text onto three axes by keyword.
    struct KeywordEncoder;

    impl TextEncoder for KeywordEncoder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let text = text.to_lowercase();
                    let axis = |word: &str| if text.contains(word) { 1.0 } else { 0.0 };
                    crate::processing::embedding::normalize_embedding(&[
                        axis("java"),
                        axis("python"),
                        axis("sales"),
                    ])
                })
                .collect())
        }
    }

    struct FailingEncoder;

    impl TextEncoder for FailingEncoder {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
            Err(EncoderError::Encode("injected failure".to_string()))
        }
    }

    /// Records every text it is asked to encode.
    struct RecordingEncoder(Arc<Mutex<Vec<String>>>);

    impl TextEncoder for RecordingEncoder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
            let mut seen = self.0.lock().expect("encoder log");
            seen.extend(texts.iter().cloned());
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    fn embedding_recommender(encoder: Box<dyn TextEncoder>) -> Recommender {
        let corpus = corpus();
        let rows = KeywordEncoder
            .encode(&[
                "java".to_string(),
                "python".to_string(),
                "sales".to_string(),
            ])
            .expect("keyword encoding");
        let snapshot = EmbeddingSnapshot::from_rows("keyword", rows).expect("uniform rows");
        let strategy = EmbeddingStrategy::load(&corpus, &snapshot, encoder).expect("valid index");
        Recommender::new(corpus, Strategy::Embedding(strategy)).expect("matching sizes")
    }

    fn urls(results: &[RecommendationResult]) -> Vec<&str> {
        results.iter().map(|r| r.item.url.as_str()).collect()
    }

    #[test]
    fn lexical_ranks_shared_vocabulary_first() {
        let recommender = Recommender::lexical(corpus());

        let results = recommender.recommend("java programming", 2).expect("recommend");

        assert_eq!(urls(&results), vec!["u1", "u2"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn blank_query_returns_empty() {
        let recommender = Recommender::lexical(corpus());

        for k in [1, 5, 10] {
            assert!(recommender.recommend("", k).expect("recommend").is_empty());
            assert!(recommender.recommend("   ", k).expect("recommend").is_empty());
        }
    }

    #[test]
    fn top_k_larger_than_corpus_returns_whole_corpus() {
        let recommender = Recommender::lexical(corpus());

        let results = recommender.recommend("skill", 10).expect("recommend");

        assert_eq!(results.len(), 3);
    }

    #[test]
    fn out_of_vocabulary_query_still_ranks() {
        let recommender = Recommender::lexical(corpus());

        let results = recommender.recommend("astronomy", 2).expect("recommend");

        assert_eq!(urls(&results), vec!["u1", "u2"]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn scores_are_bounded_and_sorted() {
        let recommender = Recommender::lexical(corpus());

        let results = recommender.recommend("measures sales skill", 10).expect("recommend");

        assert!(results.iter().all(|r| (-1.0..=1.0001).contains(&r.score)));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let recommender = Recommender::lexical(corpus());

        let first = recommender.recommend("python skill", 3).expect("recommend");
        let second = recommender.recommend("python skill", 3).expect("recommend");

        assert_eq!(first, second);
    }

    #[test]
    fn embedding_strategy_ranks_by_inner_product() {
        let recommender = embedding_recommender(Box::new(KeywordEncoder));

        let results = recommender.recommend("Python developer", 1).expect("recommend");

        assert_eq!(urls(&results), vec!["u2"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(recommender.strategy().kind(), StrategyKind::Embedding);
    }

    #[test]
    fn encoder_failure_fails_the_call() {
        let recommender = embedding_recommender(Box::new(FailingEncoder));

        assert!(matches!(
            recommender.recommend("java", 3),
            Err(RecommendError::Encoder(_))
        ));
    }

    #[test]
    fn embedding_rows_must_match_corpus() {
        let snapshot =
            EmbeddingSnapshot::from_rows("keyword", vec![vec![1.0, 0.0, 0.0]]).expect("rows");

        let result = EmbeddingStrategy::load(&corpus(), &snapshot, Box::new(KeywordEncoder));

        assert!(matches!(
            result,
            Err(RecommendError::Index(IndexError::RowCountMismatch { .. }))
        ));
    }

    #[test]
    fn results_carry_catalog_fields() {
        let recommender = Recommender::lexical(corpus());

        let results = recommender.recommend("sales negotiation", 1).expect("recommend");

        assert_eq!(results[0].item.name, "Sales Aptitude");
        assert_eq!(results[0].position, 2);
    }

    #[test]
    fn embedding_query_reaches_encoder_verbatim() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recommender = embedding_recommender(Box::new(RecordingEncoder(seen.clone())));

        let results = recommender.recommend("Java  Cookie settings", 1).expect("recommend");

        assert_eq!(urls(&results), vec!["u1"]);
        assert_eq!(*seen.lock().expect("encoder log"), vec!["Java  Cookie settings"]);
    }

    #[test]
    fn lexical_query_is_normalized_before_vectorizing() {
        let strategy = Strategy::Lexical(LexicalStrategy::fit(&corpus()));

        let raw = strategy.encode_query("Java  Cookie settings").expect("encode");
        let clean = strategy.encode_query("java").expect("encode");

        assert_eq!(raw, clean);
        assert!(matches!(raw, QueryVector::Sparse(ref v) if !v.is_zero()));
    }
}
