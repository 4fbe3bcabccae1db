use crate::models::{Field, FieldMap};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format accepted for incident dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Gold evidence: label -> ordered sentence indices
pub type GoldEvidence = BTreeMap<String, Vec<usize>>;

/// A free-text incident narrative with optional gold annotations.
///
/// Produced by ingestion and read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Unique identifier
    pub incident_id: String,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_name: Option<String>,

    /// Narrative text
    #[serde(default)]
    pub text: String,

    /// Calendar date (`YYYY-MM-DD`), unvalidated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Gold labels per field
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub labels: FieldMap<Vec<String>>,

    /// Gold evidence sentence indices per field and label
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub evidence_gold: FieldMap<GoldEvidence>,
}

impl IncidentRecord {
    pub fn new(incident_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            incident_name: None,
            text: text.into(),
            date: None,
            labels: FieldMap::new(),
            evidence_gold: FieldMap::new(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_labels<S: Into<String>>(
        mut self,
        field: Field,
        labels: impl IntoIterator<Item = S>,
    ) -> Self {
        self.labels
            .insert(field, labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_evidence(
        mut self,
        field: Field,
        label: impl Into<String>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.evidence_gold
            .entry_or_default(field)
            .insert(label.into(), indices.into_iter().collect());
        self
    }

    /// Gold labels for a field (empty when absent)
    pub fn gold_labels(&self, field: Field) -> &[String] {
        self.labels.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Non-empty text and at least one field with gold labels
    pub fn is_labeled(&self) -> bool {
        self.has_text() && self.labels.values().any(|labels| !labels.is_empty())
    }

    /// Parsed date; unparseable dates are treated as absent
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let value = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
    }

    /// Whether any gold evidence list is non-empty
    pub fn has_gold_evidence(&self) -> bool {
        self.evidence_gold
            .values()
            .any(|by_label| by_label.values().any(|indices| !indices.is_empty()))
    }
}
