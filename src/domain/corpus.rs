use std::collections::HashMap;

use crate::domain::assessment::CatalogItem;

/// Ordered, read-only set of catalog items.
///
/// The position of an item is its identity for the lifetime of a loaded
/// index; the normalized URL identifies it across reloads.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    items: Vec<CatalogItem>,
    positions: HashMap<String, usize>,
}

impl Corpus {
    /// Builds a corpus keeping the first occurrence of every normalized URL.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut positions = HashMap::with_capacity(items.len());

        for item in items {
            let key = item.normalized_url();
            if positions.contains_key(&key) {
                log::warn!("Dropping duplicate catalog item {}", item.url);
                continue;
            }
            positions.insert(key, kept.len());
            kept.push(item);
        }

        Self {
            items: kept,
            positions,
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks an item up by any URL that normalizes to the same key.
    pub fn position_of(&self, url: &str) -> Option<usize> {
        self.positions
            .get(&crate::domain::assessment::normalize_url(url))
            .copied()
    }

    /// Descriptions in corpus order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.description.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_by_normalized_url_are_dropped() {
        let corpus = Corpus::new(vec![
            CatalogItem::new("A", "first", "https://x.com/view/a/"),
            CatalogItem::new("B", "second", "https://x.com/view/b"),
            CatalogItem::new("A again", "third", "https://x.com/view/a"),
        ]);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).map(|i| i.name.as_str()), Some("A"));
        assert_eq!(corpus.get(1).map(|i| i.name.as_str()), Some("B"));
    }

    #[test]
    fn position_of_matches_normalized_url() {
        let corpus = Corpus::new(vec![
            CatalogItem::new("A", "first", "https://x.com/view/a/"),
            CatalogItem::new("B", "second", "https://x.com/view/b"),
        ]);

        assert_eq!(corpus.position_of("https://x.com/view/b/"), Some(1));
        assert_eq!(corpus.position_of("https://x.com/view/c"), None);
    }
}
