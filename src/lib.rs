//! Evidence-grounded multi-label tagging of incident narratives.
//!
//! Incidents are tagged along four fields (subsystem, failure mode, impact,
//! cause) by pluggable predictors and scored against gold labels and gold
//! evidence sentences.
//!
//! ```no_run
//! use incident_tagger::baselines::{KeywordScorer, LabelPredictor};
//! use incident_tagger::models::IncidentRecord;
//!
//! let scorer = KeywordScorer::builtin();
//! let record = IncidentRecord::new("ift-1", "The engine shutdown triggered a fire.");
//! let prediction = scorer.predict(&record)?;
//! # Ok::<(), incident_tagger::AppError>(())
//! ```

pub mod baselines;
pub mod config;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod io;
pub mod ml;
pub mod models;
pub mod pipeline;
pub mod text;

pub use error::{AppError, Result};
