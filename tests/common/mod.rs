//! Helpers for integration tests.

use std::path::PathBuf;

use catalog_recommender::models::config::ServerConfig;
use catalog_recommender::repository::FileRepository;
use tempfile::TempDir;

/// Temporary snapshot directory used in integration tests.
pub struct TestSnapshot {
    dir: TempDir,
}

impl TestSnapshot {
    pub fn new(corpus_json: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir.");
        std::fs::write(dir.path().join("assessments.json"), corpus_json)
            .expect("Failed to write corpus snapshot.");
        TestSnapshot { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            links_path: self.path("links.json"),
            corpus_path: self.path("assessments.json"),
            embeddings_path: self.path("embeddings.f32"),
            embeddings_meta_path: self.path("embeddings.json"),
            ..ServerConfig::default()
        }
    }

    pub fn repo(&self) -> FileRepository {
        FileRepository::from_config(&self.config())
    }
}

pub const SAMPLE_CORPUS: &str = r#"[
    {"assessment_name": "Java Test", "description": "measures java programming skill", "url": "u1",
     "remote_support": "Yes", "duration": 20, "test_type": ["Knowledge & Skills"]},
    {"assessment_name": "Python Test", "description": "measures python programming skill", "url": "u2"},
    {"assessment_name": "Sales Aptitude", "description": "measures sales negotiation ability", "url": "u3"}
]"#;
