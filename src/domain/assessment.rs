use serde::{Deserialize, Serialize};
use url::Url;

/// Yes/No facet as published on catalog pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Yes,
    No,
}

/// A single catalog entry as persisted in the corpus snapshot.
///
/// Required fields are `assessment_name`, `description` and `url`; facets are
/// optional and passed through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "assessment_name")]
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_support: Option<Support>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_support: Option<Support>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<Vec<String>>,
}

impl CatalogItem {
    /// Creates an item without any facets.
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            adaptive_support: None,
            remote_support: None,
            duration: None,
            test_type: None,
        }
    }

    /// Durable identity of the item across reloads.
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Reduces a URL to `scheme://host[:port]/path` without trailing slashes.
///
/// Query strings and fragments are dropped. Values that do not parse as
/// absolute URLs are only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) => {
            let mut normalized = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
            if let Some(port) = url.port() {
                normalized.push_str(&format!(":{port}"));
            }
            normalized.push_str(url.path().trim_end_matches('/'));
            normalized
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// A ranked catalog item produced by a single recommendation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendationResult {
    #[serde(skip)]
    pub position: usize,
    pub score: f32,
    #[serde(flatten)]
    pub item: CatalogItem,
}

/// Response row shape consumed by request-handling layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAssessment {
    pub url: String,
    pub name: String,
    pub adaptive_support: Support,
    pub description: String,
    pub duration: Option<f64>,
    pub remote_support: Support,
    pub test_type: Vec<String>,
}

impl From<&RecommendationResult> for RecommendedAssessment {
    fn from(result: &RecommendationResult) -> Self {
        let item = &result.item;
        Self {
            url: item.url.clone(),
            name: item.name.clone(),
            adaptive_support: item.adaptive_support.unwrap_or(Support::No),
            description: item.description.clone(),
            duration: item.duration,
            remote_support: item.remote_support.unwrap_or(Support::Yes),
            test_type: item.test_type.clone().unwrap_or_default(),
        }
    }
}
