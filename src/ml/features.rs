use crate::error::Result;
use crate::ml::models::FeatureConfig;
use crate::text::split_sentences;
use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use validator::Validate;

/// Runs of two or more word characters
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Lower-cased word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// TF-IDF vectorizer over word n-grams.
///
/// Vocabulary indices follow lexicographic term order. Rows are
/// L2-normalised; idf is smoothed as `ln((1 + n) / (1 + df)) + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: FeatureConfig,

    /// Term -> column
    vocabulary: BTreeMap<String, usize>,

    /// Per-column idf
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        })
    }

    /// N-gram terms of a text, in order of appearance, with repeats
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let mut terms = Vec::new();
        for n in self.config.ngram_min..=self.config.ngram_max {
            if n == 0 || n > tokens.len() {
                continue;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Build vocabulary and idf from the training texts
    pub fn fit(&mut self, texts: &[&str]) -> Result<()> {
        let n_docs = texts.len();
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for text in texts {
            let unique: BTreeSet<String> = self.terms(text).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = self.config.max_df * n_docs as f64;
        let kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.config.min_df && (*df as f64) <= max_count)
            .collect();

        let n = n_docs as f64;
        self.idf = kept
            .iter()
            .map(|(_, df)| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _))| (term, idx))
            .collect();

        debug!(
            n_docs,
            n_features = self.vocabulary.len(),
            "Fitted TF-IDF vocabulary"
        );
        Ok(())
    }

    /// Vectorize one text; out-of-vocabulary terms are ignored
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut row = Array1::<f64>::zeros(self.n_features());
        for term in self.terms(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                row[idx] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
        row
    }

    pub fn transform_batch(&self, texts: &[&str]) -> Array2<f64> {
        let mut matrix = Array2::zeros((texts.len(), self.n_features()));
        for (i, text) in texts.iter().enumerate() {
            matrix.row_mut(i).assign(&self.transform(text));
        }
        matrix
    }

    /// Indices of the `k` sentences with the largest summed weight of their
    /// distinct terms under the document vector. Ties go to the earlier
    /// sentence; sentences with no weighted terms are never selected.
    pub fn top_sentences(&self, text: &str, k: usize) -> Vec<usize> {
        let doc = self.transform(text);

        let mut scored: Vec<(usize, f64)> = split_sentences(text)
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let distinct: BTreeSet<String> = self.terms(sentence).into_iter().collect();
                let score: f64 = distinct
                    .iter()
                    .filter_map(|term| self.vocabulary.get(term))
                    .map(|&col| doc[col])
                    .sum();
                (idx, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.into_iter().take(k).map(|(idx, _)| idx).collect()
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }
}
