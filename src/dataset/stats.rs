use crate::models::{FieldMap, IncidentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label counts per field over labeled incidents
pub type LabelDistribution = FieldMap<BTreeMap<String, usize>>;

/// Corpus summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_total: usize,
    pub n_with_text: usize,
    pub n_labeled: usize,
    /// Mean whitespace token count over incidents with text
    pub avg_length_tokens: f64,
    /// Mean number of gold labels per labeled incident
    pub avg_label_cardinality: f64,
}

pub fn dataset_stats(records: &[IncidentRecord]) -> DatasetStats {
    let lengths: Vec<usize> = records
        .iter()
        .filter(|r| r.has_text())
        .map(|r| r.text.split_whitespace().count())
        .collect();

    let cardinalities: Vec<usize> = records
        .iter()
        .filter(|r| r.is_labeled())
        .map(|r| r.labels.values().map(Vec::len).sum())
        .collect();

    DatasetStats {
        n_total: records.len(),
        n_with_text: lengths.len(),
        n_labeled: cardinalities.len(),
        avg_length_tokens: mean(&lengths),
        avg_label_cardinality: mean(&cardinalities),
    }
}

pub fn label_distribution(records: &[IncidentRecord]) -> LabelDistribution {
    let mut distribution = LabelDistribution::new();
    for record in records.iter().filter(|r| r.is_labeled()) {
        for (field, labels) in record.labels.iter() {
            let counts = distribution.entry_or_default(field);
            for label in labels {
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
        }
    }
    distribution
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}
