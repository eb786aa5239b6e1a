use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

use crate::domain::assessment::CatalogItem;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("unknown embedding model `{0}`")]
    UnknownModel(String),
    #[error("failed to initialize embedder: {0}")]
    Init(String),
    #[error("failed to generate embedding: {0}")]
    Encode(String),
}

/// Build the text embedded for a catalog item: lowercased trimmed name and
/// description joined by a period.
pub(crate) fn item_embedding_prompt(item: &CatalogItem) -> String {
    format!(
        "{}. {}",
        item.name.trim().to_lowercase(),
        item.description.trim().to_lowercase()
    )
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub(crate) fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// A sentence encoder producing fixed-length L2-normalized vectors.
pub trait TextEncoder: Send + Sync {
    fn model_name(&self) -> &str;

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError>;
}

/// Maps a configured model name onto a fastembed model.
pub fn resolve_model(name: &str) -> Result<EmbeddingModel, EncoderError> {
    match name.to_lowercase().as_str() {
        "all-mpnet-base-v2" | "sentence-transformers/all-mpnet-base-v2" => {
            Ok(EmbeddingModel::AllMpnetBaseV2)
        }
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "multilingual-e5-large" | "intfloat/multilingual-e5-large" => {
            Ok(EmbeddingModel::MultilingualE5Large)
        }
        _ => Err(EncoderError::UnknownModel(name.to_string())),
    }
}

/// Pretrained encoder backed by fastembed.
///
/// Inference needs exclusive access to the session, so concurrent callers
/// are serialized on the inner mutex.
pub struct FastEmbedEncoder {
    model_name: String,
    embedder: Mutex<TextEmbedding>,
}

impl FastEmbedEncoder {
    pub fn try_new(model_name: &str) -> Result<Self, EncoderError> {
        let model = resolve_model(model_name)?;
        let embedder = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|error| EncoderError::Init(format!("{error:?}")))?;

        log::info!("Initialized embedder {model_name}");

        Ok(Self {
            model_name: model_name.to_string(),
            embedder: Mutex::new(embedder),
        })
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let mut embedder = self
            .embedder
            .lock()
            .map_err(|_| EncoderError::Encode("embedder mutex poisoned".to_string()))?;

        let embeddings = embedder
            .embed(texts.to_vec(), None)
            .map_err(|error| EncoderError::Encode(format!("{error:?}")))?;

        Ok(embeddings
            .iter()
            .map(|value| normalize_embedding(value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_joins_lowercased_name_and_description() {
        let item = CatalogItem::new("  Core Java ", "Measures JAVA skills ", "u1");

        assert_eq!(item_embedding_prompt(&item), "core java. measures java skills");
    }

    #[test]
    fn normalize_embedding_scales_to_unit_length() {
        let normalized = normalize_embedding(&[3.0, 4.0]);

        assert_eq!(normalized, vec![0.6, 0.8]);
    }

    #[test]
    fn normalize_embedding_keeps_zero_vector() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn unknown_model_name_is_rejected() {
        assert!(matches!(
            resolve_model("word2vec"),
            Err(EncoderError::UnknownModel(_))
        ));
        assert!(resolve_model("All-MPNet-Base-V2").is_ok());
    }
}
