use crate::domain::corpus::Corpus;
use crate::processing::embedding::{TextEncoder, item_embedding_prompt, normalize_embedding};
use crate::processing::recommender::RecommendError;
use crate::repository::{CatalogReader, EmbeddingSnapshot, EmbeddingWriter, RepositoryError};

/// Encodes every corpus item into an embedding snapshot in corpus order.
pub fn build_embedding_snapshot(
    corpus: &Corpus,
    encoder: &dyn TextEncoder,
) -> Result<EmbeddingSnapshot, RecommendError> {
    let prompts: Vec<String> = corpus.items().iter().map(item_embedding_prompt).collect();
    let rows: Vec<Vec<f32>> = encoder
        .encode(&prompts)?
        .iter()
        .map(|row| normalize_embedding(row))
        .collect();

    if rows.len() != corpus.len() {
        return Err(RepositoryError::EmbeddingShape(format!(
            "encoder returned {} rows for {} items",
            rows.len(),
            corpus.len()
        ))
        .into());
    }

    Ok(EmbeddingSnapshot::from_rows(encoder.model_name(), rows)?)
}

/// Loads the corpus, encodes it and persists the vector file and sidecar.
pub fn build_embedding_index<R>(repo: &R, encoder: &dyn TextEncoder) -> Result<usize, RecommendError>
where
    R: CatalogReader + EmbeddingWriter,
{
    let corpus = Corpus::new(repo.list_items()?);
    log::info!("Encoding {} catalog items", corpus.len());

    let snapshot = build_embedding_snapshot(&corpus, encoder)?;
    let saved = repo.save_embeddings(&snapshot)?;

    log::info!(
        "Saved {saved} embeddings of dimension {}",
        snapshot.meta.dimensions
    );
    Ok(saved)
}
