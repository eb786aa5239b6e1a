use serde::Serialize;

use crate::domain::corpus::Corpus;

/// Split of checked URLs into those present in the corpus and those missing.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

/// Compares `urls` against the corpus by normalized URL.
pub fn check_urls<S: AsRef<str>>(corpus: &Corpus, urls: &[S]) -> CoverageReport {
    let mut report = CoverageReport::default();
    for url in urls {
        let url = url.as_ref();
        if corpus.position_of(url).is_some() {
            report.present.push(url.to_string());
        } else {
            report.missing.push(url.to_string());
        }
    }

    log::info!(
        "Checked {} URLs: {} present, {} missing",
        urls.len(),
        report.present.len(),
        report.missing.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::CatalogItem;

    #[test]
    fn urls_match_regardless_of_trailing_slash() {
        let corpus = Corpus::new(vec![CatalogItem::new(
            "Java 8",
            "d",
            "https://www.shl.com/products/product-catalog/view/java-8-new/",
        )]);

        let report = check_urls(
            &corpus,
            &[
                "https://www.shl.com/products/product-catalog/view/java-8-new",
                "https://www.shl.com/products/product-catalog/view/python-new/",
            ],
        );

        assert_eq!(
            report.present,
            vec!["https://www.shl.com/products/product-catalog/view/java-8-new"]
        );
        assert_eq!(
            report.missing,
            vec!["https://www.shl.com/products/product-catalog/view/python-new/"]
        );
    }
}
