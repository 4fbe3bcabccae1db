use crate::error::{AppError, Result};
use crate::models::{Field, FieldMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// On-disk schema document: `{labels: {field: [label, ...]}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    labels: FieldMap<Vec<String>>,
}

/// Immutable mapping from field to the ordered set of permitted labels.
///
/// Every label emitted by a predictor or read from gold data is checked
/// against this set; anything outside it is filtered without error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSchema {
    labels: FieldMap<Vec<String>>,
}

impl LabelSchema {
    /// Build a schema from per-field label lists. Duplicate labels keep
    /// their first position.
    pub fn new(labels: FieldMap<Vec<String>>) -> Self {
        let labels = labels
            .iter()
            .map(|(field, list)| {
                let mut seen = HashSet::new();
                let unique: Vec<String> = list
                    .iter()
                    .filter(|label| seen.insert(label.as_str()))
                    .cloned()
                    .collect();
                (field, unique)
            })
            .collect();

        Self { labels }
    }

    pub fn from_fields<I, L, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (Field, L)>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            fields
                .into_iter()
                .map(|(field, labels)| (field, labels.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    /// Parse a YAML schema document
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let document: SchemaDocument = serde_yaml::from_str(source)?;

        for field in Field::all() {
            if !document.labels.contains(field) {
                warn!(field = %field, "Schema has no labels for field; all of its labels will be filtered");
            }
        }

        Ok(Self::new(document.labels))
    }

    /// Load a YAML schema document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source).map_err(|e| {
            AppError::Configuration(format!("Invalid schema {}: {}", path.display(), e))
        })
    }

    /// Allowed labels for a field, in schema order
    pub fn labels(&self, field: Field) -> &[String] {
        self.labels.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: Field, label: &str) -> bool {
        self.labels(field).iter().any(|l| l == label)
    }

    pub fn index_of(&self, field: Field, label: &str) -> Option<usize> {
        self.labels(field).iter().position(|l| l == label)
    }

    /// Keep only schema-allowed labels, reordered to schema order and deduplicated
    pub fn filter<S: AsRef<str>>(&self, field: Field, labels: &[S]) -> Vec<String> {
        self.labels(field)
            .iter()
            .filter(|allowed| labels.iter().any(|l| l.as_ref() == allowed.as_str()))
            .cloned()
            .collect()
    }

    pub fn n_labels(&self, field: Field) -> usize {
        self.labels(field).len()
    }
}
