use crate::dataset::rng::SeededRng;
use crate::error::{AppError, Result};
use crate::models::IncidentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::Display;
use tracing::info;

/// How the test partition was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitStrategy {
    /// Latest dated incidents form the test set
    Time,
    /// Seeded shuffle of incident ids
    Random,
}

/// Persisted train/test partition of the labeled incidents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub strategy: SplitStrategy,
    pub seed: u64,
    pub test_size: f64,
    pub n_labeled: usize,
    pub train: Vec<String>,
    pub test: Vec<String>,
}

impl SplitRecord {
    pub fn train_ids(&self) -> BTreeSet<String> {
        self.train.iter().cloned().collect()
    }

    pub fn test_ids(&self) -> BTreeSet<String> {
        self.test.iter().cloned().collect()
    }
}

/// Deterministic train/test splitter over labeled incidents
#[derive(Debug, Clone)]
pub struct DatasetSplitter {
    seed: u64,
    test_size: f64,
}

impl DatasetSplitter {
    pub fn new(seed: u64, test_size: f64) -> Result<Self> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(AppError::Validation(format!(
                "test_size must lie strictly between 0 and 1, got {}",
                test_size
            )));
        }
        Ok(Self { seed, test_size })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn test_size(&self) -> f64 {
        self.test_size
    }

    /// Partition the labeled incidents.
    ///
    /// When any labeled incident has a parseable date the time strategy
    /// applies: dated incidents are ordered by date and the latest
    /// `max(1, round(n_dated * test_size))` become the test set, everything
    /// else (including undated incidents) goes to train. Otherwise ids are
    /// shuffled with the seed and the first `max(1, round(n * test_size))`
    /// become the test set.
    pub fn split(&self, records: &[IncidentRecord]) -> SplitRecord {
        let labeled: Vec<&IncidentRecord> = records.iter().filter(|r| r.is_labeled()).collect();

        let mut dated = Vec::new();
        let mut undated = Vec::new();
        for record in &labeled {
            match record.parsed_date() {
                Some(date) => dated.push((date, record.incident_id.clone())),
                None => undated.push(record.incident_id.clone()),
            }
        }

        let (strategy, train, test) = if dated.is_empty() {
            let mut ids: Vec<String> = labeled.iter().map(|r| r.incident_id.clone()).collect();
            SeededRng::new(self.seed).shuffle(&mut ids);

            let test_n = test_count(ids.len(), self.test_size).min(ids.len());
            let train = ids.split_off(test_n);
            (SplitStrategy::Random, train, ids)
        } else {
            // stable: equal dates keep input order
            dated.sort_by_key(|(date, _)| *date);
            let mut ordered: Vec<String> = dated.into_iter().map(|(_, id)| id).collect();

            let test_n = test_count(ordered.len(), self.test_size).min(ordered.len());
            let test = ordered.split_off(ordered.len() - test_n);
            ordered.extend(undated);
            (SplitStrategy::Time, ordered, test)
        };

        info!(
            strategy = %strategy,
            n_labeled = labeled.len(),
            n_train = train.len(),
            n_test = test.len(),
            "Created dataset split"
        );

        SplitRecord {
            strategy,
            seed: self.seed,
            test_size: self.test_size,
            n_labeled: labeled.len(),
            train,
            test,
        }
    }
}

/// `max(1, round(n * fraction))` with half-to-even rounding
pub fn test_count(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).round_ties_even() as usize).max(1)
}
