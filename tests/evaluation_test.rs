//! Integration tests for label and evidence evaluation against real
//! predictor output

mod common;

use common::{flight_corpus, incident};
use incident_tagger::baselines::{KeywordScorer, LabelPredictor};
use incident_tagger::eval::{
    evidence_report_markdown, label_report_markdown, EvidenceEvaluator, LabelEvaluator,
};
use incident_tagger::io::index_by_id;
use incident_tagger::ml::{BaselineConfig, LabelStatus, StatisticalBaseline};
use incident_tagger::models::{
    EvidenceRef, Field, FieldPrediction, IncidentRecord, LabelSchema, PredictionRecord,
};
use std::collections::{BTreeMap, BTreeSet};

fn gold_index(records: Vec<IncidentRecord>) -> BTreeMap<String, IncidentRecord> {
    index_by_id(records, |r| r.incident_id.as_str())
}

fn prediction_index(predictions: Vec<PredictionRecord>) -> BTreeMap<String, PredictionRecord> {
    index_by_id(predictions, |p| p.incident_id.as_str())
}

#[test]
fn test_keyword_engine_example_scores_perfectly() {
    let records = vec![
        incident("a", "The raptor engine shut down early.", None)
            .with_labels(Field::Subsystem, ["raptor_engine"]),
        incident("b", "Weather delayed the launch.", None)
            .with_labels(Field::Impact, ["delay"]),
    ];
    let scorer = KeywordScorer::builtin();
    let predictions: Vec<PredictionRecord> = records
        .iter()
        .map(|r| scorer.predict(r))
        .collect::<Result<_, _>>()
        .unwrap();

    let report = LabelEvaluator::new(KeywordScorer::builtin().table().label_schema()).evaluate(
        &gold_index(records),
        &prediction_index(predictions),
        None,
    );

    assert_eq!(report.n, 2);
    let raptor = report.fields.get(Field::Subsystem).unwrap().label("raptor_engine").unwrap();
    assert_eq!(raptor.support, 1);
    assert_eq!(raptor.precision, 1.0);
    assert_eq!(raptor.recall, 1.0);
    assert_eq!(raptor.f1, 1.0);
}

#[test]
fn test_zero_division_yields_zero_not_nan() {
    let schema = LabelSchema::from_fields([(Field::Cause, ["unknown", "software_fault"])]);
    let gold = gold_index(vec![incident("a", "Text.", None)]);
    let predictions = prediction_index(vec![PredictionRecord::new("a")]);

    let report = LabelEvaluator::new(schema).evaluate(&gold, &predictions, None);
    let cause = report.fields.get(Field::Cause).unwrap();

    assert_eq!(cause.micro_precision, 0.0);
    assert_eq!(cause.micro_recall, 0.0);
    assert_eq!(cause.micro_f1, 0.0);
    assert_eq!(cause.macro_f1, 0.0);
    for (_, metrics) in &cause.per_label {
        assert!(metrics.f1.is_finite());
        assert_eq!(metrics.support, 0);
    }
}

#[test]
fn test_restriction_to_unknown_ids_reports_no_fields() {
    let gold = gold_index(flight_corpus());
    let predictions = prediction_index(vec![PredictionRecord::new("ift-1")]);
    let restrict: BTreeSet<String> = ["missing".to_string()].into_iter().collect();

    let report = LabelEvaluator::new(KeywordScorer::builtin().table().label_schema())
        .evaluate(&gold, &predictions, Some(&restrict));

    assert_eq!(report.n, 0);
    assert!(report.fields.is_empty());
    assert!(label_report_markdown(&report).starts_with("# Classification Metrics"));
}

#[test]
fn test_always_on_label_has_full_confidence() {
    let corpus = flight_corpus();
    let train: Vec<&IncidentRecord> = corpus
        .iter()
        .filter(|r| ["ift-1", "ift-2", "ift-3", "ift-5"].contains(&r.incident_id.as_str()))
        .collect();
    let schema = KeywordScorer::builtin().table().label_schema();

    let fitted = StatisticalBaseline::new(schema, BaselineConfig::default())
        .unwrap()
        .fit(&train)
        .unwrap();
    assert_eq!(
        fitted.label_status(Field::Impact, "vehicle_loss"),
        Some(LabelStatus::AlwaysOn)
    );
    assert_eq!(
        fitted.label_status(Field::Impact, "delay"),
        Some(LabelStatus::Inert)
    );

    let prediction = fitted
        .predict(&incident("new", "Unrelated narrative about weather.", None))
        .unwrap();
    assert!(prediction.labels(Field::Impact).contains(&"vehicle_loss".to_string()));
    assert_eq!(
        prediction.confidence.get(Field::Impact).unwrap()["vehicle_loss"],
        1.0
    );
    assert!(!prediction.labels(Field::Impact).contains(&"delay".to_string()));
}

#[test]
fn test_evidence_metrics_are_bounded_and_recall_grows_with_k() {
    let corpus = flight_corpus();
    let scorer = KeywordScorer::builtin();
    let predictions: Vec<PredictionRecord> = corpus
        .iter()
        .map(|r| scorer.predict(r))
        .collect::<Result<_, _>>()
        .unwrap();

    let report =
        EvidenceEvaluator::new().evaluate(&gold_index(corpus), &prediction_index(predictions), None);

    assert_eq!(report.n_incidents, 4);
    let overall = report.overall.metrics;
    for value in [
        overall.precision_at_1,
        overall.precision_at_3,
        overall.recall_at_1,
        overall.recall_at_3,
        report.overall.coverage,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }
    assert!(overall.recall_at_3 >= overall.recall_at_1);
    for (_, metrics) in report.per_field.iter() {
        assert!(metrics.recall_at_3 >= metrics.recall_at_1);
    }
    assert_eq!(report.per_field.len(), 4);
    assert!(evidence_report_markdown(&report).contains("| Coverage |"));
}

#[test]
fn test_literal_sentence_evidence_is_resolved() {
    let gold = gold_index(vec![incident(
        "a",
        "Engine one failed.  Fire spread aft. The vehicle was lost.",
        None,
    )
    .with_labels(Field::FailureMode, ["fire"])
    .with_evidence(Field::FailureMode, "fire", [1])]);

    let mut fire = FieldPrediction::default();
    fire.labels.push("fire".to_string());
    fire.evidence.insert(
        "fire".to_string(),
        EvidenceRef::Sentences(vec!["Fire   spread aft.".to_string()]),
    );
    let predictions =
        prediction_index(vec![PredictionRecord::new("a").with_field(Field::FailureMode, fire)]);

    let report = EvidenceEvaluator::new().evaluate(&gold, &predictions, None);
    assert_eq!(report.overall.metrics.precision_at_1, 1.0);
    assert_eq!(report.overall.metrics.recall_at_1, 1.0);
    assert_eq!(report.overall.coverage, 1.0);
}

#[test]
fn test_missing_prediction_counts_as_empty_evidence() {
    let gold = gold_index(flight_corpus());
    let report = EvidenceEvaluator::new().evaluate(&gold, &BTreeMap::new(), None);

    assert_eq!(report.n_incidents, 4);
    assert_eq!(report.overall.coverage, 0.0);
    assert_eq!(report.overall.metrics.recall_at_3, 0.0);
}
