use crate::models::{Field, FieldMap, LabelSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Evidence attached to a predicted label.
///
/// Producers either point at sentences by index (in the coordinate system of
/// [`crate::text::split_sentences`]) or quote the sentences verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceRef {
    Indices(Vec<usize>),
    Sentences(Vec<String>),
}

impl EvidenceRef {
    pub fn is_empty(&self) -> bool {
        match self {
            EvidenceRef::Indices(indices) => indices.is_empty(),
            EvidenceRef::Sentences(sentences) => sentences.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EvidenceRef::Indices(indices) => indices.len(),
            EvidenceRef::Sentences(sentences) => sentences.len(),
        }
    }
}

impl Default for EvidenceRef {
    fn default() -> Self {
        EvidenceRef::Indices(Vec::new())
    }
}

/// Labels, confidences and evidence predicted for one field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPrediction {
    pub labels: Vec<String>,
    pub confidence: BTreeMap<String, f64>,
    pub evidence: BTreeMap<String, EvidenceRef>,
}

/// One line of a prediction stream.
///
/// Key order on the wire is fixed: `incident_id`, `pred`, `confidence`, `evidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub incident_id: String,

    #[serde(default)]
    pub pred: FieldMap<Vec<String>>,

    #[serde(default)]
    pub confidence: FieldMap<BTreeMap<String, f64>>,

    #[serde(default)]
    pub evidence: FieldMap<BTreeMap<String, EvidenceRef>>,
}

impl PredictionRecord {
    pub fn new(incident_id: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            pred: FieldMap::new(),
            confidence: FieldMap::new(),
            evidence: FieldMap::new(),
        }
    }

    /// Store the prediction for a field, replacing any previous one
    pub fn set_field(&mut self, field: Field, prediction: FieldPrediction) {
        self.pred.insert(field, prediction.labels);
        self.confidence.insert(field, prediction.confidence);
        self.evidence.insert(field, prediction.evidence);
    }

    pub fn with_field(mut self, field: Field, prediction: FieldPrediction) -> Self {
        self.set_field(field, prediction);
        self
    }

    /// Predicted labels for a field (empty when absent)
    pub fn labels(&self, field: Field) -> &[String] {
        self.pred.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn evidence_for(&self, field: Field, label: &str) -> Option<&EvidenceRef> {
        self.evidence.get(field)?.get(label)
    }

    /// Drop every label, confidence and evidence entry the schema does not allow
    pub fn retain_schema(&mut self, schema: &LabelSchema) {
        for field in Field::all() {
            if let Some(labels) = self.pred.get_mut(field) {
                *labels = schema.filter(field, labels.as_slice());
            }
            if let Some(confidence) = self.confidence.get_mut(field) {
                confidence.retain(|label, _| schema.contains(field, label));
            }
            if let Some(evidence) = self.evidence.get_mut(field) {
                evidence.retain(|label, _| schema.contains(field, label));
            }
        }
    }
}
