//! Sentence segmentation.
//!
//! The segmenter defines the evidence coordinate system: sentence index `i`
//! always means the i-th sentence this segmenter produces for a given text.
//! Every component that writes or reads evidence indices goes through here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Sentence-ending punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Split text into trimmed, non-empty sentences.
///
/// A boundary sits after `.`, `!` or `?` when followed by whitespace; the
/// punctuation stays with the preceding sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // punctuation is a single ASCII byte
        push_trimmed(&mut sentences, &text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

/// Collapse internal whitespace runs to single spaces and trim
pub fn normalize_sentence(sentence: &str) -> String {
    sentence.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps whitespace-normalised sentence text back to its index
#[derive(Debug, Clone, Default)]
pub struct SentenceLookup {
    index: HashMap<String, usize>,
}

impl SentenceLookup {
    /// Build from segmented sentences. A sentence that occurs more than once
    /// resolves to its last index.
    pub fn new(sentences: &[String]) -> Self {
        let mut index = HashMap::with_capacity(sentences.len());
        for (i, sentence) in sentences.iter().enumerate() {
            index.insert(normalize_sentence(sentence), i);
        }
        Self { index }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(&split_sentences(text))
    }

    /// Exact match after whitespace normalisation
    pub fn index_of(&self, sentence: &str) -> Option<usize> {
        self.index.get(&normalize_sentence(sentence)).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
