use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Semaphore;
use url::Url;

use crate::crawlers::{CatalogCrawler, CrawlerError, CrawlerResult, build_reqwest_client};
use crate::domain::assessment::{CatalogItem, Support};
use crate::models::config::CrawlerConfig;
use crate::processing::normalizer::{normalize, strip_catalog_preamble};

/// Heading keywords that introduce the descriptive part of a detail page.
const DESCRIPTION_HEADINGS: [&str; 4] = ["overview", "description", "what", "measure"];

/// Page markers of bundled solutions, which are not individual items.
const PACKAGED_MARKERS: [&str; 2] = ["pre-packaged", "job solution"];

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)completion time in minutes\s*=\s*(\d+(?:\.\d+)?)").expect("static pattern")
});

static TEST_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:test type):?\s*((?:[ABCDEKPS]\s+)*[ABCDEKPS])\b").expect("static pattern")
});

static REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)remote testing:?\s*(yes|no)\b").expect("static pattern")
});

static ADAPTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)adaptive/irt:?\s*(yes|no)\b").expect("static pattern")
});

/// Tracks consecutive listing pages that yielded nothing new.
#[derive(Debug)]
pub struct PaginationState {
    max_empty_pages: usize,
    empty_pages: usize,
}

impl PaginationState {
    pub fn new(max_empty_pages: usize) -> Self {
        Self {
            max_empty_pages,
            empty_pages: 0,
        }
    }

    /// Records a page with `new_links` unseen links and reports whether the
    /// next page should be fetched.
    pub fn observe(&mut self, new_links: usize) -> bool {
        if new_links > 0 {
            self.empty_pages = 0;
        } else {
            self.empty_pages += 1;
        }
        self.empty_pages < self.max_empty_pages
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    let text = element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    decode_html_entities(&text).into_owned()
}

/// Collects item detail links from a catalog listing page.
pub fn extract_catalog_links(html: &str, base_url: &Url) -> HashSet<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static selector");

    document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let is_detail = href.starts_with("/products/product-catalog/view/")
                || (href.starts_with("/products/assessments/") && href.matches('/').count() > 4);
            if !is_detail {
                return None;
            }
            Some(base_url.join(href).ok()?.to_string())
        })
        .collect()
}

/// Text following descriptive headings, or the `main` element as fallback.
fn extract_description(document: &Html) -> String {
    let headings = Selector::parse("h2, h3").expect("static selector");
    let mut collected = Vec::new();

    for heading in document.select(&headings) {
        let title = element_text(heading).to_lowercase();
        if !DESCRIPTION_HEADINGS.iter().any(|k| title.contains(k)) {
            continue;
        }
        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            let name = sibling.value().name();
            if name == "h2" || name == "h3" {
                break;
            }
            collected.push(element_text(sibling));
        }
    }

    if !collected.is_empty() {
        return normalize(&collected.join(" "));
    }

    let main = Selector::parse("main").expect("static selector");
    document
        .select(&main)
        .next()
        .map(|el| normalize(strip_catalog_preamble(&element_text(el))))
        .unwrap_or_default()
}

fn test_type_name(code: char) -> Option<&'static str> {
    match code {
        'A' => Some("Ability & Aptitude"),
        'B' => Some("Biodata & Situational Judgement"),
        'C' => Some("Competencies"),
        'D' => Some("Development & 360"),
        'E' => Some("Assessment Exercises"),
        'K' => Some("Knowledge & Skills"),
        'P' => Some("Personality & Behavior"),
        'S' => Some("Simulations"),
        _ => None,
    }
}

fn support_marker(pattern: &Regex, text: &str) -> Option<Support> {
    let value = pattern.captures(text)?.get(1)?.as_str().to_lowercase();
    match value.as_str() {
        "yes" => Some(Support::Yes),
        "no" => Some(Support::No),
        _ => None,
    }
}

/// Parses an item detail page.
///
/// Pages without an `h1` and pages describing bundled solutions are
/// rejected. Facets are filled in only when their marker is present.
pub fn parse_item_page(html: &str, url: &str) -> Option<CatalogItem> {
    let document = Html::parse_document(html);

    let h1 = Selector::parse("h1").expect("static selector");
    let name = document
        .select(&h1)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())?;

    let page_text = element_text(document.root_element());
    let lower = page_text.to_lowercase();
    if PACKAGED_MARKERS.iter().any(|marker| lower.contains(marker)) {
        log::debug!("Skipping packaged solution {url}");
        return None;
    }

    let mut item = CatalogItem::new(name, extract_description(&document), url);

    item.duration = DURATION
        .captures(&page_text)
        .and_then(|c| c.get(1)?.as_str().parse::<f64>().ok());
    item.test_type = TEST_TYPE.captures(&page_text).and_then(|c| {
        let types: Vec<String> = c
            .get(1)?
            .as_str()
            .chars()
            .filter_map(test_type_name)
            .map(str::to_string)
            .collect();
        (!types.is_empty()).then_some(types)
    });
    item.remote_support = support_marker(&REMOTE, &page_text);
    item.adaptive_support = support_marker(&ADAPTIVE, &page_text);

    Some(item)
}

/// Crawler for the SHL product catalog which limits concurrent HTTP requests
/// using a [`Semaphore`] and sleeps between requests.
pub struct CatalogCrawlerShl {
    base_url: Url,
    catalog_url: Url,
    config: CrawlerConfig,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl CatalogCrawlerShl {
    pub fn new(config: CrawlerConfig) -> CrawlerResult<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)
                .map_err(|e| CrawlerError::Build(e.to_string()))?,
            catalog_url: Url::parse(&config.catalog_url)
                .map_err(|e| CrawlerError::Build(e.to_string()))?,
            client: build_reqwest_client(&config)?,
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config,
        })
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms)
    }

    /// Listing page URL for a catalog offset and type.
    pub fn listing_url(&self, start: usize, type_id: u32) -> String {
        let mut url = self.catalog_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("start", &start.to_string())
            .append_pair("type", &type_id.to_string());
        url.to_string()
    }

    /// Fetches a URL as text, holding a semaphore permit for the request and
    /// the politeness delay that follows it.
    ///
    /// Non-success statuses and transport errors are logged and skipped.
    async fn fetch_text(&self, url: &str) -> Option<String> {
        let _permit = self.semaphore.acquire().await.ok()?;
        let text = self.request_text(url).await;
        // Failed requests still hit the server, so they wait too.
        tokio::time::sleep(self.delay()).await;
        text
    }

    async fn request_text(&self, url: &str) -> Option<String> {
        let res = match self.client.get(url).send().await {
            Ok(res) => res,
            Err(e) => {
                log::error!("Failed to get URL {url}: {e}");
                return None;
            }
        };
        if !res.status().is_success() {
            log::error!("Failed to get URL {}: {}", url, res.status());
            return None;
        }
        res.text().await.ok()
    }

    async fn crawl_type(&self, type_id: u32, seen: &mut HashSet<String>) {
        log::info!("Crawling catalog type={type_id}");
        let mut state = PaginationState::new(self.config.max_empty_pages);
        let mut start = 0;

        loop {
            let url = self.listing_url(start, type_id);
            let links = match self.fetch_text(&url).await {
                Some(text) => extract_catalog_links(&text, &self.base_url),
                None => HashSet::new(),
            };

            let before = seen.len();
            seen.extend(links);
            let new_links = seen.len() - before;
            if new_links > 0 {
                log::info!("start={start}: found {new_links} NEW links");
            } else {
                log::info!("start={start}: no new unique links");
            }

            if !state.observe(new_links) {
                log::info!("No new links for multiple pages. Stopping type={type_id}");
                break;
            }

            start += self.config.page_step;
        }
    }
}

#[async_trait]
impl CatalogCrawler for CatalogCrawlerShl {
    async fn get_links(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        for type_id in self.config.catalog_types.clone() {
            self.crawl_type(type_id, &mut seen).await;
        }

        let mut links: Vec<String> = seen.into_iter().collect();
        links.sort();
        links
    }

    async fn get_item(&self, url: &str) -> Option<CatalogItem> {
        let text = self.fetch_text(url).await?;
        parse_item_page(&text, url)
    }
}
