use crate::ml::classifier::LogisticRegressionClassifier;
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::{Validate, ValidationError};

/// TF-IDF vectorizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ngram_range"))]
pub struct FeatureConfig {
    /// Smallest n-gram length
    #[serde(default = "default_ngram_min")]
    #[validate(range(min = 1))]
    pub ngram_min: usize,

    /// Largest n-gram length
    #[serde(default = "default_ngram_max")]
    #[validate(range(min = 1, max = 5))]
    pub ngram_max: usize,

    /// Minimum number of documents a term must occur in
    #[serde(default = "default_min_df")]
    #[validate(range(min = 1))]
    pub min_df: usize,

    /// Maximum fraction of documents a term may occur in
    #[serde(default = "default_max_df")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub max_df: f64,
}

fn default_ngram_min() -> usize {
    1
}

fn default_ngram_max() -> usize {
    2
}

fn default_min_df() -> usize {
    1
}

fn default_max_df() -> f64 {
    0.95
}

fn validate_ngram_range(config: &FeatureConfig) -> Result<(), ValidationError> {
    if config.ngram_min > config.ngram_max {
        return Err(ValidationError::new("ngram_min_exceeds_ngram_max"));
    }
    Ok(())
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ngram_min: default_ngram_min(),
            ngram_max: default_ngram_max(),
            min_df: default_min_df(),
            max_df: default_max_df(),
        }
    }
}

/// Statistical baseline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BaselineConfig {
    /// Probability at or above which a label is predicted
    #[serde(default = "default_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f64,

    /// L2 regularisation strength
    #[serde(default = "default_alpha")]
    #[validate(range(exclusive_min = 0.0))]
    pub alpha: f64,

    /// Evidence sentences attached to each predicted label
    #[serde(default = "default_max_evidence")]
    pub max_evidence: usize,

    #[serde(default)]
    #[validate(nested)]
    pub features: FeatureConfig,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_alpha() -> f64 {
    1.0
}

fn default_max_evidence() -> usize {
    3
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            alpha: default_alpha(),
            max_evidence: default_max_evidence(),
            features: FeatureConfig::default(),
        }
    }
}

/// How a label behaves, decided once from its train-set count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LabelStatus {
    /// Never observed in training; never predicted
    Inert,
    /// Observed on every training record; always predicted
    AlwaysOn,
    /// Both present and absent in training; gets a classifier
    Active,
}

impl LabelStatus {
    /// A zero count wins over a full one, so an empty train set is all inert
    pub fn from_count(count: usize, n_docs: usize) -> Self {
        if count == 0 {
            LabelStatus::Inert
        } else if count >= n_docs {
            LabelStatus::AlwaysOn
        } else {
            LabelStatus::Active
        }
    }
}

/// Fitted state of one label
#[derive(Debug, Clone)]
pub enum LabelModel {
    Inert,
    AlwaysOn,
    Trained(LogisticRegressionClassifier),
}

impl LabelModel {
    pub fn status(&self) -> LabelStatus {
        match self {
            LabelModel::Inert => LabelStatus::Inert,
            LabelModel::AlwaysOn => LabelStatus::AlwaysOn,
            LabelModel::Trained(_) => LabelStatus::Active,
        }
    }
}
