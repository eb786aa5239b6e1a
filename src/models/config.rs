//! Configuration model loaded from external sources.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Which similarity strategy backs the recommender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// TF-IDF vectors fitted on the corpus descriptions.
    #[default]
    Lexical,
    /// Precomputed sentence embeddings searched with an exact flat index.
    Embedding,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
/// Politeness and pagination settings for the catalog crawler.
pub struct CrawlerConfig {
    pub base_url: String,
    pub catalog_url: String,
    pub catalog_types: Vec<u32>,
    /// Offset increment between listing pages.
    pub page_step: usize,
    /// Consecutive listing pages without new links before a type is done.
    pub max_empty_pages: usize,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.shl.com".to_string(),
            catalog_url: "https://www.shl.com/products/product-catalog/".to_string(),
            catalog_types: vec![1, 2],
            page_step: 12,
            max_empty_pages: 5,
            delay_ms: 500,
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            concurrency: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub links_path: PathBuf,
    pub corpus_path: PathBuf,
    pub embeddings_path: PathBuf,
    pub embeddings_meta_path: PathBuf,
    pub strategy: StrategyKind,
    pub embedding_model: String,
    pub zmq_address: String,
    pub crawler: CrawlerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            links_path: PathBuf::from("data/raw/assessment_links.json"),
            corpus_path: PathBuf::from("data/processed/assessments.json"),
            embeddings_path: PathBuf::from("data/processed/assessment_embeddings.f32"),
            embeddings_meta_path: PathBuf::from("data/processed/assessment_embeddings.json"),
            strategy: StrategyKind::default(),
            embedding_model: "all-mpnet-base-v2".to_string(),
            zmq_address: "tcp://127.0.0.1:5555".to_string(),
            crawler: CrawlerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Layers `config/default.yaml`, an optional explicit file and `APP__*`
    /// environment variables on top of the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_catalog_crawl_settings() {
        let config = ServerConfig::default();

        assert_eq!(config.strategy, StrategyKind::Lexical);
        assert_eq!(config.crawler.page_step, 12);
        assert_eq!(config.crawler.max_empty_pages, 5);
        assert_eq!(config.crawler.catalog_types, vec![1, 2]);
    }

    #[test]
    fn load_reads_explicit_yaml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "strategy: embedding\ncorpus_path: /tmp/items.json\ncrawler:\n  delay_ms: 10"
        )
        .expect("write config");

        let config = ServerConfig::load(Some(file.path())).expect("config loads");

        assert_eq!(config.strategy, StrategyKind::Embedding);
        assert_eq!(config.corpus_path, PathBuf::from("/tmp/items.json"));
        assert_eq!(config.crawler.delay_ms, 10);
        assert_eq!(config.crawler.page_step, 12);
    }
}
