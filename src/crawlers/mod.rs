use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::assessment::CatalogItem;
use crate::models::config::CrawlerConfig;

pub mod shl;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to build crawler: {0}")]
    Build(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;

/// An abstraction over catalog crawlers that discover and parse item pages.
#[async_trait]
pub trait CatalogCrawler: Send + Sync {
    /// Walks the paginated catalog and returns every item detail URL found.
    async fn get_links(&self) -> Vec<String>;

    /// Fetches a single detail page and parses it into a [`CatalogItem`].
    ///
    /// Returns `None` for failed fetches and for pages that do not describe
    /// an individual item.
    async fn get_item(&self, url: &str) -> Option<CatalogItem>;
}

/// Builds the shared HTTP client with the configured user agent and timeout.
pub fn build_reqwest_client(config: &CrawlerConfig) -> CrawlerResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}
