//! TF-IDF vectorizer over unigrams and bigrams.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::processing::stop_words::ENGLISH_STOP_WORDS;

/// Upper bound on retained vocabulary terms.
pub const MAX_FEATURES: usize = 5000;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Lowercased word tokens of two or more characters, stop words removed,
/// followed by the bigrams of adjacent remaining tokens.
fn analyze(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(word))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|word| word.to_string()).collect();
    terms.extend(words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

/// Sparse vector with strictly increasing indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVector {
    fn from_map(map: BTreeMap<usize, f32>) -> Self {
        let (indices, values) = map.into_iter().unzip();
        Self { indices, values }
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            self.values.iter_mut().for_each(|v| *v /= norm);
        }
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; zero when either side is the zero vector.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            0.0
        } else {
            self.dot(other) / denom
        }
    }
}

/// Vocabulary and IDF weights fitted once on a corpus.
#[derive(Clone, Debug, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fits on `texts` and returns the vectorizer with the corpus matrix.
    ///
    /// Terms are ranked by document frequency, then total count, then
    /// lexically; the best [`MAX_FEATURES`] are kept and indexed in sorted
    /// order. IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit_transform<S: AsRef<str>>(texts: &[S]) -> (Self, Vec<SparseVector>) {
        let analyzed: Vec<Vec<String>> = texts.iter().map(|t| analyze(t.as_ref())).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut total: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let mut seen = HashSet::new();
            for term in terms {
                *total.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<&str> = doc_freq.keys().copied().collect();
        ranked.sort_by_key(|term| (Reverse(doc_freq[term]), Reverse(total[term]), *term));
        ranked.truncate(MAX_FEATURES);
        ranked.sort_unstable();

        let n = texts.len() as f32;
        let idf = ranked
            .iter()
            .map(|term| ((1.0 + n) / (1.0 + doc_freq[term] as f32)).ln() + 1.0)
            .collect();
        let vocabulary = ranked
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let vectorizer = Self { vocabulary, idf };
        let matrix = analyzed
            .iter()
            .map(|terms| vectorizer.weigh(terms))
            .collect();

        log::debug!(
            "Fitted TF-IDF vocabulary of {} terms on {} documents",
            vectorizer.dimensions(),
            texts.len()
        );

        (vectorizer, matrix)
    }

    /// Projects `text` into the fitted vocabulary; unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&analyze(text))
    }

    fn weigh(&self, terms: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        for (idx, weight) in counts.iter_mut() {
            *weight *= self.idf[*idx];
        }

        let mut vector = SparseVector::from_map(counts);
        vector.normalize();
        vector
    }

    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }

    /// Retained terms in index order.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms = vec![""; self.idf.len()];
        for (term, &idx) in &self.vocabulary {
            terms[idx] = term.as_str();
        }
        terms
    }
}
