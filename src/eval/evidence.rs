use crate::models::{EvidenceRef, Field, FieldMap, IncidentRecord, PredictionRecord};
use crate::text::SentenceLookup;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Precision and recall of evidence at k = 1 and k = 3
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvidenceMetrics {
    #[serde(rename = "precision@1")]
    pub precision_at_1: f64,
    #[serde(rename = "precision@3")]
    pub precision_at_3: f64,
    #[serde(rename = "recall@1")]
    pub recall_at_1: f64,
    #[serde(rename = "recall@3")]
    pub recall_at_3: f64,
}

/// Overall metrics plus coverage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverallEvidenceMetrics {
    #[serde(flatten)]
    pub metrics: EvidenceMetrics,
    pub coverage: f64,
}

/// `{overall, per_field, n_incidents}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceReport {
    pub overall: OverallEvidenceMetrics,
    /// Every field is listed, zero-valued when it had no gold evidence
    pub per_field: FieldMap<EvidenceMetrics>,
    /// Incidents with at least one non-empty gold evidence list
    pub n_incidents: usize,
}

/// Running sums for the four ranked metrics
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sums: [f64; 4],
    count: usize,
}

impl Accumulator {
    fn push(&mut self, gold: &BTreeSet<usize>, predicted: &[usize]) {
        let (p1, r1) = score_at_k(gold, predicted, 1);
        let (p3, r3) = score_at_k(gold, predicted, 3);
        for (sum, value) in self.sums.iter_mut().zip([p1, p3, r1, r3]) {
            *sum += value;
        }
        self.count += 1;
    }

    fn mean(&self) -> EvidenceMetrics {
        if self.count == 0 {
            return EvidenceMetrics::default();
        }
        let n = self.count as f64;
        EvidenceMetrics {
            precision_at_1: self.sums[0] / n,
            precision_at_3: self.sums[1] / n,
            recall_at_1: self.sums[2] / n,
            recall_at_3: self.sums[3] / n,
        }
    }
}

/// Precision and recall of the first `k` predicted indices.
///
/// An empty prediction scores zero on both. Precision divides by `k`
/// even when fewer than `k` indices were predicted.
pub fn score_at_k(gold: &BTreeSet<usize>, predicted: &[usize], k: usize) -> (f64, f64) {
    let top: BTreeSet<usize> = predicted.iter().take(k).copied().collect();
    if top.is_empty() || gold.is_empty() || k == 0 {
        return (0.0, 0.0);
    }
    let hits = top.intersection(gold).count() as f64;
    (hits / k as f64, hits / gold.len() as f64)
}

/// Turn predicted evidence into sentence indices.
///
/// Literal sentences are looked up after whitespace normalisation;
/// sentences that do not occur in the text are dropped.
pub fn resolve_evidence(evidence: &EvidenceRef, lookup: &SentenceLookup) -> Vec<usize> {
    match evidence {
        EvidenceRef::Indices(indices) => indices.clone(),
        EvidenceRef::Sentences(sentences) => sentences
            .iter()
            .filter_map(|sentence| lookup.index_of(sentence))
            .collect(),
    }
}

/// Compares predicted evidence with gold evidence sentence indices
#[derive(Debug, Clone, Default)]
pub struct EvidenceEvaluator;

impl EvidenceEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Score every (incident, field, label) with non-empty gold evidence.
    ///
    /// An incident with no prediction counts as predicting nothing.
    pub fn evaluate(
        &self,
        gold: &BTreeMap<String, IncidentRecord>,
        predictions: &BTreeMap<String, PredictionRecord>,
        restrict: Option<&BTreeSet<String>>,
    ) -> EvidenceReport {
        let mut overall = Accumulator::default();
        let mut per_field: BTreeMap<Field, Accumulator> = BTreeMap::new();
        let mut n_incidents = 0;
        let mut n_covered = 0;

        for (id, record) in gold {
            if restrict.is_some_and(|ids| !ids.contains(id)) || !record.has_gold_evidence() {
                continue;
            }
            let prediction = predictions.get(id);
            let lookup = SentenceLookup::from_text(&record.text);
            let mut any_predicted = false;

            for (field, by_label) in record.evidence_gold.iter() {
                for (label, gold_indices) in by_label {
                    if gold_indices.is_empty() {
                        continue;
                    }
                    let predicted = prediction
                        .and_then(|p| p.evidence_for(field, label))
                        .map(|e| resolve_evidence(e, &lookup))
                        .unwrap_or_default();
                    any_predicted |= !predicted.is_empty();

                    let gold_set: BTreeSet<usize> = gold_indices.iter().copied().collect();
                    overall.push(&gold_set, &predicted);
                    per_field.entry(field).or_default().push(&gold_set, &predicted);
                }
            }

            n_incidents += 1;
            if any_predicted {
                n_covered += 1;
            }
        }

        let coverage = if n_incidents == 0 {
            0.0
        } else {
            n_covered as f64 / n_incidents as f64
        };

        info!(n_incidents, n_instances = overall.count, coverage, "Evaluated evidence");

        EvidenceReport {
            overall: OverallEvidenceMetrics {
                metrics: overall.mean(),
                coverage,
            },
            per_field: Field::all()
                .map(|field| (field, per_field.get(&field).map(Accumulator::mean).unwrap_or_default()))
                .collect(),
            n_incidents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldPrediction;

    const TEXT: &str = "Engine one failed. Fire spread aft. The vehicle was lost.";

    fn gold(id: &str) -> IncidentRecord {
        IncidentRecord::new(id, TEXT)
            .with_labels(Field::FailureMode, ["fire"])
            .with_evidence(Field::FailureMode, "fire", [1])
    }

    fn with_evidence(id: &str, evidence: EvidenceRef) -> PredictionRecord {
        let mut prediction = FieldPrediction::default();
        prediction.labels.push("fire".to_string());
        prediction.evidence.insert("fire".to_string(), evidence);
        PredictionRecord::new(id).with_field(Field::FailureMode, prediction)
    }

    fn one(id: &str, value: IncidentRecord) -> BTreeMap<String, IncidentRecord> {
        [(id.to_string(), value)].into_iter().collect()
    }

    fn pred(id: &str, value: PredictionRecord) -> BTreeMap<String, PredictionRecord> {
        [(id.to_string(), value)].into_iter().collect()
    }

    #[test]
    fn test_score_at_k() {
        let gold: BTreeSet<usize> = [1, 2].into_iter().collect();
        assert_eq!(score_at_k(&gold, &[], 1), (0.0, 0.0));
        assert_eq!(score_at_k(&gold, &[1], 1), (1.0, 0.5));
        assert_eq!(score_at_k(&gold, &[0, 1], 1), (0.0, 0.0));

        let (p3, r3) = score_at_k(&gold, &[0, 1], 3);
        assert!((p3 - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(r3, 0.5);
    }

    #[test]
    fn test_exact_index_match() {
        let report = EvidenceEvaluator::new().evaluate(
            &one("a", gold("a")),
            &pred("a", with_evidence("a", EvidenceRef::Indices(vec![1, 0]))),
            None,
        );

        assert_eq!(report.n_incidents, 1);
        assert_eq!(report.overall.coverage, 1.0);
        assert_eq!(report.overall.metrics.precision_at_1, 1.0);
        assert_eq!(report.overall.metrics.recall_at_1, 1.0);
        assert!((report.overall.metrics.precision_at_3 - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            report.per_field.get(Field::FailureMode).unwrap().recall_at_3,
            1.0
        );
        assert_eq!(report.per_field.len(), 4);
    }

    #[test]
    fn test_sentence_strings_are_resolved() {
        let evidence = EvidenceRef::Sentences(vec![
            "Fire   spread\naft.".to_string(),
            "Not in the text.".to_string(),
        ]);
        let report = EvidenceEvaluator::new().evaluate(
            &one("a", gold("a")),
            &pred("a", with_evidence("a", evidence)),
            None,
        );
        assert_eq!(report.overall.metrics.precision_at_1, 1.0);
    }

    #[test]
    fn test_missing_prediction_scores_zero() {
        let report = EvidenceEvaluator::new().evaluate(&one("a", gold("a")), &BTreeMap::new(), None);

        assert_eq!(report.n_incidents, 1);
        assert_eq!(report.overall.coverage, 0.0);
        assert_eq!(report.overall.metrics, EvidenceMetrics::default());
    }

    #[test]
    fn test_wrong_evidence_still_counts_for_coverage() {
        let report = EvidenceEvaluator::new().evaluate(
            &one("a", gold("a")),
            &pred("a", with_evidence("a", EvidenceRef::Indices(vec![2]))),
            None,
        );
        assert_eq!(report.overall.coverage, 1.0);
        assert_eq!(report.overall.metrics.recall_at_3, 0.0);
    }

    #[test]
    fn test_repeated_sentence_resolves_to_last_occurrence() {
        let record = IncidentRecord::new("a", "Fire seen. Vent opened. Fire seen.")
            .with_labels(Field::FailureMode, ["fire"])
            .with_evidence(Field::FailureMode, "fire", [2]);
        let evidence = EvidenceRef::Sentences(vec!["Fire seen.".to_string()]);

        let lookup = SentenceLookup::from_text(&record.text);
        assert_eq!(resolve_evidence(&evidence, &lookup), [2]);

        let report = EvidenceEvaluator::new().evaluate(
            &one("a", record),
            &pred("a", with_evidence("a", evidence)),
            None,
        );
        assert_eq!(report.overall.metrics.precision_at_1, 1.0);
        assert_eq!(report.overall.metrics.recall_at_1, 1.0);
    }

    #[test]
    fn test_incidents_without_gold_evidence_are_skipped() {
        let record = IncidentRecord::new("a", TEXT).with_evidence(Field::Cause, "unknown", []);
        let report = EvidenceEvaluator::new().evaluate(&one("a", record), &BTreeMap::new(), None);

        assert_eq!(report.n_incidents, 0);
        assert_eq!(report.overall.coverage, 0.0);
    }

    #[test]
    fn test_report_json_keys() {
        let report = EvidenceEvaluator::new().evaluate(&one("a", gold("a")), &BTreeMap::new(), None);
        let value = serde_json::to_value(&report).unwrap();

        assert!(value["overall"]["precision@1"].is_number());
        assert!(value["overall"]["coverage"].is_number());
        assert!(value["per_field"]["cause"]["recall@3"].is_number());
        assert_eq!(value["n_incidents"], 1);
    }
}
