use std::collections::HashSet;

use futures::future;

use crate::crawlers::CatalogCrawler;
use crate::domain::assessment::CatalogItem;
use crate::repository::{CatalogWriter, LinkReader, LinkWriter, RepositoryResult};

/// Walks the catalog listing pages and persists every discovered detail link.
pub async fn crawl_catalog_links<C, R>(crawler: &C, repo: &R) -> RepositoryResult<usize>
where
    C: CatalogCrawler + ?Sized,
    R: LinkWriter,
{
    log::info!("Started crawling catalog links");

    let links = crawler.get_links().await;
    let saved = repo.save_links(&links)?;

    log::info!("Finished crawling catalog links: {saved} unique links");
    Ok(saved)
}

/// Keeps the first item for every normalized URL, preserving order.
pub(crate) fn dedup_items(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.normalized_url()))
        .collect()
}

/// Fetches every persisted link, parses the detail pages and stores the
/// resulting corpus. Pages that fail or are rejected are skipped.
pub async fn parse_catalog_items<C, R>(crawler: &C, repo: &R) -> RepositoryResult<usize>
where
    C: CatalogCrawler + ?Sized,
    R: LinkReader + CatalogWriter,
{
    let urls = repo.list_links()?;
    log::info!("Parsing {} catalog pages", urls.len());

    let tasks = urls.iter().map(|url| crawler.get_item(url));
    let parsed = future::join_all(tasks).await;

    let total = parsed.len();
    let items = dedup_items(parsed.into_iter().flatten().collect());
    if items.len() < total {
        log::warn!("Skipped {} of {total} pages", total - items.len());
    }

    let saved = repo.save_items(&items)?;
    log::info!("Finished parsing: {saved} individual items");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FakeCrawler;

    #[async_trait]
    impl CatalogCrawler for FakeCrawler {
        async fn get_links(&self) -> Vec<String> {
            vec!["https://x.com/b".to_string(), "https://x.com/a".to_string()]
        }

        async fn get_item(&self, url: &str) -> Option<CatalogItem> {
            if url.ends_with("broken") {
                return None;
            }
            Some(CatalogItem::new(url.to_uppercase(), "desc", url))
        }
    }

    #[derive(Default)]
    struct FakeRepo {
        links: Mutex<Vec<String>>,
        items: Mutex<Vec<CatalogItem>>,
    }

    impl LinkReader for FakeRepo {
        fn list_links(&self) -> RepositoryResult<Vec<String>> {
            Ok(self.links.lock().expect("links mutex").clone())
        }
    }

    impl LinkWriter for FakeRepo {
        fn save_links(&self, links: &[String]) -> RepositoryResult<usize> {
            *self.links.lock().expect("links mutex") = links.to_vec();
            Ok(links.len())
        }
    }

    impl CatalogWriter for FakeRepo {
        fn save_items(&self, items: &[CatalogItem]) -> RepositoryResult<usize> {
            *self.items.lock().expect("items mutex") = items.to_vec();
            Ok(items.len())
        }
    }

    #[tokio::test]
    async fn crawl_persists_links() {
        let repo = FakeRepo::default();

        let saved = crawl_catalog_links(&FakeCrawler, &repo).await.expect("crawl");

        assert_eq!(saved, 2);
        assert_eq!(repo.links.lock().expect("links mutex").len(), 2);
    }

    #[tokio::test]
    async fn parse_skips_failures_and_duplicates() {
        let repo = FakeRepo::default();
        repo.save_links(&[
            "https://x.com/a".to_string(),
            "https://x.com/broken".to_string(),
            "https://x.com/a/".to_string(),
            "https://x.com/b".to_string(),
        ])
        .expect("seed links");

        let saved = parse_catalog_items(&FakeCrawler, &repo).await.expect("parse");

        let items = repo.items.lock().expect("items mutex").clone();
        assert_eq!(saved, 2);
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.com/a", "https://x.com/b"]);
    }
}
