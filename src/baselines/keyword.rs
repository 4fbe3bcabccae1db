use crate::baselines::keywords::{KeywordTable, LabelTriggers};
use crate::baselines::LabelPredictor;
use crate::error::Result;
use crate::models::{EvidenceRef, Field, FieldPrediction, IncidentRecord, LabelSchema, PredictionRecord};
use crate::text::split_sentences;

/// Confidence never reaches certainty
pub const MAX_KEYWORD_CONFIDENCE: f64 = 0.95;

pub const DEFAULT_MAX_EVIDENCE: usize = 3;

/// `min(0.95, 0.3 + 0.2 * hits)`
pub fn keyword_confidence(hits: usize) -> f64 {
    (0.3 + 0.2 * hits as f64).min(MAX_KEYWORD_CONFIDENCE)
}

/// Stateless rule-based tagger over a fixed keyword table
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    table: KeywordTable,
    schema: LabelSchema,
    max_evidence: usize,
}

impl KeywordScorer {
    pub fn new(table: KeywordTable, schema: LabelSchema) -> Self {
        Self {
            table,
            schema,
            max_evidence: DEFAULT_MAX_EVIDENCE,
        }
    }

    /// Built-in table with its own label space as schema
    pub fn builtin() -> Self {
        let table = KeywordTable::builtin();
        let schema = table.label_schema();
        Self::new(table, schema)
    }

    pub fn with_max_evidence(mut self, max_evidence: usize) -> Self {
        self.max_evidence = max_evidence;
        self
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Score one field of a text, before schema filtering.
    ///
    /// Labels come out in table order. A label fires when at least one of
    /// its phrases is a substring of the lower-cased text; its evidence is
    /// every sentence containing one of its phrases, in phrase-then-sentence
    /// order, deduplicated and capped.
    pub fn score_labels(&self, text: &str, field: Field) -> FieldPrediction {
        let lowered = text.to_lowercase();
        let sentences: Vec<String> = split_sentences(text)
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut prediction = FieldPrediction::default();
        for triggers in self.table.triggers(field) {
            let (hits, evidence) = self.match_label(triggers, &lowered, &sentences);
            if hits == 0 {
                continue;
            }
            prediction.labels.push(triggers.label.clone());
            prediction
                .confidence
                .insert(triggers.label.clone(), keyword_confidence(hits));
            prediction
                .evidence
                .insert(triggers.label.clone(), EvidenceRef::Indices(evidence));
        }
        prediction
    }

    fn match_label(
        &self,
        triggers: &LabelTriggers,
        lowered: &str,
        sentences: &[String],
    ) -> (usize, Vec<usize>) {
        let mut hits = 0;
        let mut evidence: Vec<usize> = Vec::new();

        for phrase in &triggers.phrases {
            if !lowered.contains(phrase.as_str()) {
                continue;
            }
            hits += 1;
            for (idx, sentence) in sentences.iter().enumerate() {
                if sentence.contains(phrase.as_str()) && !evidence.contains(&idx) {
                    evidence.push(idx);
                }
            }
        }

        evidence.truncate(self.max_evidence);
        (hits, evidence)
    }
}

impl LabelPredictor for KeywordScorer {
    fn name(&self) -> &str {
        "keyword"
    }

    fn predict(&self, record: &IncidentRecord) -> Result<PredictionRecord> {
        let mut prediction = PredictionRecord::new(record.incident_id.clone());
        for field in Field::all() {
            prediction.set_field(field, self.score_labels(&record.text, field));
        }
        prediction.retain_schema(&self.schema);
        Ok(prediction)
    }
}
