use crate::baselines::LabelPredictor;
use crate::error::{AppError, Result};
use crate::ml::classifier::{BinaryClassifier, LogisticRegressionClassifier};
use crate::ml::features::TfidfVectorizer;
use crate::ml::models::{BaselineConfig, LabelModel, LabelStatus};
use crate::models::{
    EvidenceRef, Field, FieldMap, FieldPrediction, IncidentRecord, LabelSchema, PredictionRecord,
};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use validator::Validate;

/// TF-IDF + one-vs-rest logistic regression, one classifier per active label
#[derive(Debug, Clone)]
pub struct StatisticalBaseline {
    schema: LabelSchema,
    config: BaselineConfig,
}

impl StatisticalBaseline {
    pub fn new(schema: LabelSchema, config: BaselineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { schema, config })
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Fit on the train partition.
    ///
    /// Each schema label is classified once from its train count: inert
    /// (count 0), always-on (count equals the train size) or active. Only
    /// active labels get a classifier; their fits run in parallel.
    pub fn fit(&self, train: &[&IncidentRecord]) -> Result<FittedBaseline> {
        let texts: Vec<&str> = train.iter().map(|r| r.text.as_str()).collect();
        let mut vectorizer = TfidfVectorizer::new(self.config.features.clone())?;
        vectorizer.fit(&texts)?;
        let x = vectorizer.transform_batch(&texts);

        let mut fields = FieldMap::new();
        for field in Field::all() {
            let models = self.fit_field(field, train, &x)?;
            fields.insert(field, models);
        }

        let fitted = FittedBaseline {
            schema: self.schema.clone(),
            config: self.config.clone(),
            vectorizer,
            fields,
            n_train: train.len(),
        };

        let summary = fitted.summary();
        info!(
            n_train = summary.n_train,
            n_features = summary.n_features,
            n_classifiers = summary.n_classifiers(),
            "Fitted statistical baseline"
        );
        Ok(fitted)
    }

    fn fit_field(
        &self,
        field: Field,
        train: &[&IncidentRecord],
        x: &Array2<f64>,
    ) -> Result<Vec<(String, LabelModel)>> {
        let n_docs = train.len();
        let n_features = x.ncols();

        let gold: Vec<Vec<String>> = train
            .iter()
            .map(|r| self.schema.filter(field, r.gold_labels(field)))
            .collect();

        let labels = self.schema.labels(field);
        let fitted: Vec<(String, LabelModel)> = labels
            .par_iter()
            .map(|label| -> Result<(String, LabelModel)> {
                let targets: Vec<bool> = gold.iter().map(|g| g.contains(label)).collect();
                let count = targets.iter().filter(|&&t| t).count();

                let model = match LabelStatus::from_count(count, n_docs) {
                    LabelStatus::Inert => LabelModel::Inert,
                    LabelStatus::AlwaysOn => LabelModel::AlwaysOn,
                    LabelStatus::Active if n_features == 0 => {
                        warn!(
                            field = %field,
                            label = %label,
                            "Empty vocabulary; label cannot be trained and is never predicted"
                        );
                        LabelModel::Inert
                    }
                    LabelStatus::Active => {
                        let mut clf = LogisticRegressionClassifier::new(self.config.alpha);
                        clf.fit(x, &targets)?;
                        LabelModel::Trained(clf)
                    }
                };
                Ok((label.clone(), model))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            field = %field,
            n_labels = fitted.len(),
            n_active = fitted
                .iter()
                .filter(|(_, m)| m.status() == LabelStatus::Active)
                .count(),
            "Fitted field"
        );
        Ok(fitted)
    }
}

/// Label partition of one field after fitting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub active: Vec<String>,
    pub always_on: Vec<String>,
    pub inert: Vec<String>,
}

/// What was fitted, written alongside predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub n_train: usize,
    pub n_features: usize,
    pub threshold: f64,
    pub fields: FieldMap<FieldSummary>,
}

impl BaselineSummary {
    pub fn n_classifiers(&self) -> usize {
        self.fields.values().map(|f| f.active.len()).sum()
    }
}

/// A fitted statistical baseline; label states never change after fitting
#[derive(Debug, Clone)]
pub struct FittedBaseline {
    schema: LabelSchema,
    config: BaselineConfig,
    vectorizer: TfidfVectorizer,
    fields: FieldMap<Vec<(String, LabelModel)>>,
    n_train: usize,
}

impl FittedBaseline {
    pub fn label_status(&self, field: Field, label: &str) -> Option<LabelStatus> {
        self.fields
            .get(field)?
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, model)| model.status())
    }

    pub fn summary(&self) -> BaselineSummary {
        let fields = self
            .fields
            .iter()
            .map(|(field, models)| {
                let mut summary = FieldSummary::default();
                for (label, model) in models {
                    let bucket = match model.status() {
                        LabelStatus::Active => &mut summary.active,
                        LabelStatus::AlwaysOn => &mut summary.always_on,
                        LabelStatus::Inert => &mut summary.inert,
                    };
                    bucket.push(label.clone());
                }
                (field, summary)
            })
            .collect();

        BaselineSummary {
            n_train: self.n_train,
            n_features: self.vectorizer.n_features(),
            threshold: self.config.threshold,
            fields,
        }
    }

    /// Labels and confidences for one field of a vectorized text
    fn predict_field(
        &self,
        field: Field,
        row: ndarray::ArrayView1<f64>,
    ) -> Result<BTreeMap<String, f64>> {
        let mut scores = BTreeMap::new();
        let Some(models) = self.fields.get(field) else {
            return Ok(scores);
        };

        for (label, model) in models {
            let score = match model {
                LabelModel::Inert => continue,
                LabelModel::AlwaysOn => 1.0,
                LabelModel::Trained(clf) => {
                    let p = clf.predict_proba(row)?;
                    if p < self.config.threshold {
                        continue;
                    }
                    p
                }
            };
            if scores.insert(label.clone(), score).is_some() {
                return Err(AppError::Internal(format!(
                    "label '{}' predicted twice for field {}",
                    label, field
                )));
            }
        }
        Ok(scores)
    }
}

impl LabelPredictor for FittedBaseline {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn predict(&self, record: &IncidentRecord) -> Result<PredictionRecord> {
        let row = self.vectorizer.transform(&record.text);
        let mut evidence: Option<Vec<usize>> = None;
        let mut prediction = PredictionRecord::new(record.incident_id.clone());

        for field in Field::all() {
            let scores = self.predict_field(field, row.view())?;

            let mut field_prediction = FieldPrediction::default();
            if !scores.is_empty() {
                // one evidence list per record, shared by every predicted label
                let top = evidence.get_or_insert_with(|| {
                    self.vectorizer
                        .top_sentences(&record.text, self.config.max_evidence)
                });
                for label in self.schema.labels(field) {
                    if let Some(&score) = scores.get(label) {
                        field_prediction.labels.push(label.clone());
                        field_prediction
                            .evidence
                            .insert(label.clone(), EvidenceRef::Indices(top.clone()));
                        field_prediction.confidence.insert(label.clone(), score);
                    }
                }
            }
            prediction.set_field(field, field_prediction);
        }

        Ok(prediction)
    }
}
