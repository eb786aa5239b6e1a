use bytemuck::{cast_slice, pod_collect_to_vec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{
    EmbeddingReader, EmbeddingWriter, FileRepository, RepositoryError, RepositoryResult,
};

/// Sidecar describing the flat vector file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMeta {
    pub model: String,
    pub dimensions: usize,
    pub rows: usize,
    pub created_at: DateTime<Utc>,
}

/// Row-major embedding matrix, one row per corpus item in corpus order.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingSnapshot {
    pub meta: EmbeddingMeta,
    pub vectors: Vec<f32>,
}

impl EmbeddingSnapshot {
    /// Flattens `rows` into a snapshot, checking they share one dimension.
    pub fn from_rows(model: &str, rows: Vec<Vec<f32>>) -> RepositoryResult<Self> {
        let dimensions = rows.first().map(Vec::len).unwrap_or_default();
        let mut vectors = Vec::with_capacity(rows.len() * dimensions);
        for (position, row) in rows.iter().enumerate() {
            if row.len() != dimensions {
                return Err(RepositoryError::EmbeddingShape(format!(
                    "row {position} has {} dimensions, expected {dimensions}",
                    row.len()
                )));
            }
            vectors.extend_from_slice(row);
        }

        Ok(Self {
            meta: EmbeddingMeta {
                model: model.to_string(),
                dimensions,
                rows: rows.len(),
                created_at: Utc::now(),
            },
            vectors,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.meta.dimensions.max(1))
    }
}

impl EmbeddingReader for FileRepository {
    fn load_embeddings(&self) -> RepositoryResult<EmbeddingSnapshot> {
        let meta: EmbeddingMeta = Self::read_json(&self.embeddings_meta_path)?;
        let bytes = Self::read(&self.embeddings_path)?;

        let expected = meta.rows * meta.dimensions * std::mem::size_of::<f32>();
        if bytes.len() != expected {
            return Err(RepositoryError::EmbeddingShape(format!(
                "{} holds {} bytes, metadata describes {} x {} f32 values",
                self.embeddings_path.display(),
                bytes.len(),
                meta.rows,
                meta.dimensions
            )));
        }

        let vectors: Vec<f32> = pod_collect_to_vec(&bytes);
        log::info!(
            "Loaded {} embeddings of dimension {} ({})",
            meta.rows,
            meta.dimensions,
            meta.model
        );

        Ok(EmbeddingSnapshot { meta, vectors })
    }
}

impl EmbeddingWriter for FileRepository {
    fn save_embeddings(&self, snapshot: &EmbeddingSnapshot) -> RepositoryResult<usize> {
        Self::write(&self.embeddings_path, cast_slice(&snapshot.vectors))?;
        Self::write_json(&self.embeddings_meta_path, &snapshot.meta)?;
        Ok(snapshot.meta.rows)
    }
}
