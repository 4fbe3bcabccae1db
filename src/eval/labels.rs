use crate::models::{Field, FieldMap, IncidentRecord, LabelSchema, PredictionRecord};
use ndarray::{Array2, ArrayView1};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Precision, recall, F1 and support for one label
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Metrics for one field. `per_label` keeps schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetrics {
    pub micro_precision: f64,
    pub micro_recall: f64,
    pub micro_f1: f64,
    pub macro_f1: f64,
    #[serde(serialize_with = "serialize_ordered_map")]
    pub per_label: Vec<(String, LabelMetrics)>,
}

impl FieldMetrics {
    pub fn label(&self, label: &str) -> Option<&LabelMetrics> {
        self.per_label
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, metrics)| metrics)
    }
}

fn serialize_ordered_map<S: Serializer>(
    entries: &[(String, LabelMetrics)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (label, metrics) in entries {
        map.serialize_entry(label, metrics)?;
    }
    map.end()
}

/// `{n, fields: {field: FieldMetrics}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelReport {
    /// Gold incidents after ID restriction
    pub n: usize,
    pub fields: FieldMap<FieldMetrics>,
}

/// True positives, false positives, false negatives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Counts {
    fn from_columns(gold: ArrayView1<u8>, pred: ArrayView1<u8>) -> Self {
        let mut counts = Counts::default();
        for (&g, &p) in gold.iter().zip(pred.iter()) {
            match (g, p) {
                (1, 1) => counts.tp += 1,
                (0, 1) => counts.fp += 1,
                (1, 0) => counts.fn_ += 1,
                _ => {}
            }
        }
        counts
    }

    fn add(&mut self, other: Counts) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }

    fn precision(&self) -> f64 {
        safe_div(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        safe_div(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        safe_div(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

/// Zero when the denominator is zero
fn safe_div(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Indicator matrix (records x labels) over the given label ordering.
/// Labels outside the ordering are ignored.
pub fn binarize<S: AsRef<str>>(labels: &[String], rows: &[&[S]]) -> Array2<u8> {
    let index: BTreeMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut matrix = Array2::zeros((rows.len(), labels.len()));
    for (r, row) in rows.iter().enumerate() {
        for label in row.iter() {
            if let Some(&c) = index.get(label.as_ref()) {
                matrix[[r, c]] = 1;
            }
        }
    }
    matrix
}

/// Compares predicted label sets with gold labels per field
#[derive(Debug, Clone)]
pub struct LabelEvaluator {
    schema: LabelSchema,
}

impl LabelEvaluator {
    pub fn new(schema: LabelSchema) -> Self {
        Self { schema }
    }

    /// Evaluate predictions against gold.
    ///
    /// With a restriction, only those ids are considered on either side.
    /// Incidents missing a prediction are left out of every field; a field
    /// with no incident present on both sides is omitted from the report.
    pub fn evaluate(
        &self,
        gold: &BTreeMap<String, IncidentRecord>,
        predictions: &BTreeMap<String, PredictionRecord>,
        restrict: Option<&BTreeSet<String>>,
    ) -> LabelReport {
        let allowed = |id: &String| restrict.map_or(true, |ids| ids.contains(id));

        let pairs: Vec<(&IncidentRecord, &PredictionRecord)> = gold
            .iter()
            .filter(|(id, _)| allowed(*id))
            .filter_map(|(id, record)| predictions.get(id).map(|pred| (record, pred)))
            .collect();
        let n = gold.keys().filter(|id| allowed(*id)).count();

        let mut fields = FieldMap::new();
        if pairs.is_empty() {
            debug!("No incident has both gold labels and a prediction");
        } else {
            for field in Field::all() {
                fields.insert(field, self.evaluate_field(field, &pairs));
            }
        }

        info!(n, n_paired = pairs.len(), "Evaluated labels");
        LabelReport { n, fields }
    }

    fn evaluate_field(
        &self,
        field: Field,
        pairs: &[(&IncidentRecord, &PredictionRecord)],
    ) -> FieldMetrics {
        let labels = self.schema.labels(field);
        let gold_rows: Vec<&[String]> = pairs.iter().map(|(g, _)| g.gold_labels(field)).collect();
        let pred_rows: Vec<&[String]> = pairs.iter().map(|(_, p)| p.labels(field)).collect();

        let y_true = binarize(labels, &gold_rows);
        let y_pred = binarize(labels, &pred_rows);

        let mut total = Counts::default();
        let mut per_label = Vec::with_capacity(labels.len());
        for (c, label) in labels.iter().enumerate() {
            let counts = Counts::from_columns(y_true.column(c), y_pred.column(c));
            total.add(counts);
            per_label.push((
                label.clone(),
                LabelMetrics {
                    precision: counts.precision(),
                    recall: counts.recall(),
                    f1: counts.f1(),
                    support: counts.tp + counts.fn_,
                },
            ));
        }

        let macro_f1 = if per_label.is_empty() {
            0.0
        } else {
            per_label.iter().map(|(_, m)| m.f1).sum::<f64>() / per_label.len() as f64
        };

        FieldMetrics {
            micro_precision: total.precision(),
            micro_recall: total.recall(),
            micro_f1: total.f1(),
            macro_f1,
            per_label,
        }
    }
}
