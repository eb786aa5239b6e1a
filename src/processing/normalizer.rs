//! Text cleanup applied to descriptions and lexical queries.

use std::sync::LazyLock;

use regex::Regex;

/// Boilerplate spans that run from the marker to the end of the text.
const NOISE_PATTERNS: [&str; 5] = [
    r"we recommend upgrading.*",
    r"latest browser options.*",
    r"cookie.*",
    r"privacy.*",
    r"all rights reserved.*",
];

static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NOISE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static noise pattern"))
        .collect()
});

static PREAMBLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)description").expect("static pattern"));

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercases `raw`, collapses whitespace and strips known boilerplate.
///
/// Whitespace is collapsed before stripping so every noise span extends to
/// the end of the text; the result is therefore a fixed point of `normalize`.
pub fn normalize(raw: &str) -> String {
    let mut text = collapse_whitespace(&raw.to_lowercase());
    for pattern in NOISE.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text.trim().to_string()
}

/// Keeps only the text after the first `description` marker, if any.
///
/// Catalog pages prefix the useful text with navigation chrome that ends in a
/// "Description" heading.
pub fn strip_catalog_preamble(text: &str) -> &str {
    match PREAMBLE_MARKER.find(text) {
        Some(marker) => text[marker.end()..].trim(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_yield_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Java\n\nProgramming   SKILL "), "java programming skill");
    }

    #[test]
    fn strips_noise_to_end_of_text() {
        assert_eq!(
            normalize("Measures reasoning. We recommend upgrading to a modern browser."),
            "measures reasoning."
        );
        assert_eq!(
            normalize("Numerical test\nCookie settings\naccept all"),
            "numerical test"
        );
    }

    #[test]
    fn noise_split_across_lines_is_still_stripped() {
        assert_eq!(normalize("Sales test we recommend\nupgrading now"), "sales test");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Verbal Reasoning\n\n  measures comprehension",
            "we recommend cookie upgrading",
            "Privacy  policy first, then content",
            "ÄRGER   über   Ümlaute",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn preamble_is_stripped_after_description_marker() {
        assert_eq!(
            strip_catalog_preamble("Home > Catalog Description Measures Java skills"),
            "Measures Java skills"
        );
        assert_eq!(strip_catalog_preamble("  plain text "), "plain text");
    }

    #[test]
    fn preamble_marker_survives_case_changing_characters() {
        assert_eq!(strip_catalog_preamble("İdescriptionẞ"), "ẞ");
        assert_eq!(
            strip_catalog_preamble("Startseite İ DESCRIPTION Maßstab für ẞ"),
            "Maßstab für ẞ"
        );
    }
}
