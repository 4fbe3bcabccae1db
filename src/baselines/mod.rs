//! Prediction producers
//!
//! Anything that turns an incident into a [`PredictionRecord`] implements
//! [`LabelPredictor`]. External producers (fine-tuned models, annotators)
//! participate by writing a prediction stream that the evaluators read.

pub mod keyword;
pub mod keywords;

pub use keyword::{keyword_confidence, KeywordScorer};
pub use keywords::{KeywordTable, LabelTriggers};

use crate::error::Result;
use crate::models::{IncidentRecord, PredictionRecord};

/// A multi-label tagger over incident narratives
pub trait LabelPredictor: Send + Sync {
    /// Short name used in artifact file names and logs
    fn name(&self) -> &str;

    /// Predict labels, confidences and evidence for one incident
    fn predict(&self, record: &IncidentRecord) -> Result<PredictionRecord>;

    /// Predict every record in order
    fn predict_all(&self, records: &[&IncidentRecord]) -> Result<Vec<PredictionRecord>> {
        records.iter().map(|record| self.predict(record)).collect()
    }
}
