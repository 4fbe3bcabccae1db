/// Statistical multi-label baseline
///
/// This module provides:
/// - TF-IDF text features over word unigrams and bigrams
/// - Binary logistic regression per label (one-vs-rest)
/// - Handling of labels that never or always occur in training

pub mod baseline;
pub mod classifier;
pub mod features;
pub mod models;

pub use baseline::{BaselineSummary, FieldSummary, FittedBaseline, StatisticalBaseline};
pub use classifier::{sigmoid, BinaryClassifier, LogisticRegressionClassifier};
pub use features::{tokenize, TfidfVectorizer};
pub use models::{BaselineConfig, FeatureConfig, LabelModel, LabelStatus};
