use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::assessment::CatalogItem;
use crate::models::config::ServerConfig;

pub mod catalog;
pub mod embedding;
pub mod link;

pub use embedding::{EmbeddingMeta, EmbeddingSnapshot};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed snapshot item at position {position}: {reason}")]
    MalformedSnapshot { position: usize, reason: String },
    #[error("embedding snapshot shape mismatch: {0}")]
    EmbeddingShape(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub trait LinkReader {
    fn list_links(&self) -> RepositoryResult<Vec<String>>;
}

pub trait LinkWriter {
    fn save_links(&self, links: &[String]) -> RepositoryResult<usize>;
}

pub trait CatalogReader {
    fn list_items(&self) -> RepositoryResult<Vec<CatalogItem>>;
}

pub trait CatalogWriter {
    fn save_items(&self, items: &[CatalogItem]) -> RepositoryResult<usize>;
}

pub trait EmbeddingReader {
    fn load_embeddings(&self) -> RepositoryResult<EmbeddingSnapshot>;
}

pub trait EmbeddingWriter {
    fn save_embeddings(&self, snapshot: &EmbeddingSnapshot) -> RepositoryResult<usize>;
}

/// Snapshot artifacts stored as plain files on disk.
#[derive(Clone, Debug)]
pub struct FileRepository {
    links_path: PathBuf,
    corpus_path: PathBuf,
    embeddings_path: PathBuf,
    embeddings_meta_path: PathBuf,
}

impl FileRepository {
    pub fn new(
        links_path: impl Into<PathBuf>,
        corpus_path: impl Into<PathBuf>,
        embeddings_path: impl Into<PathBuf>,
        embeddings_meta_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            links_path: links_path.into(),
            corpus_path: corpus_path.into(),
            embeddings_path: embeddings_path.into(),
            embeddings_meta_path: embeddings_meta_path.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.links_path,
            &config.corpus_path,
            &config.embeddings_path,
            &config.embeddings_meta_path,
        )
    }

    fn read(path: &Path) -> RepositoryResult<Vec<u8>> {
        std::fs::read(path).map_err(|source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes `bytes` to `path`, creating parent directories as needed.
    fn write(path: &Path, bytes: &[u8]) -> RepositoryResult<()> {
        let io_error = |source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, bytes).map_err(io_error)
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RepositoryResult<T> {
        let bytes = Self::read(path)?;
        serde_json::from_slice(&bytes).map_err(|source| RepositoryError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> RepositoryResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| RepositoryError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::write(path, &bytes)
    }
}
