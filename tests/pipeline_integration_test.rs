//! End-to-end pipeline tests: split, both baselines, evaluation and
//! statistics written to a temporary output directory

mod common;

use common::flight_corpus;
use incident_tagger::config::Config;
use incident_tagger::dataset::SplitStrategy;
use incident_tagger::io;
use incident_tagger::ml::BaselineSummary;
use incident_tagger::models::Field;
use incident_tagger::pipeline;
use tempfile::{tempdir, TempDir};

fn config_for(dir: &TempDir) -> Config {
    let data = dir.path().join("incidents.jsonl");
    io::write_jsonl(&data, &flight_corpus()).unwrap();

    let mut config = Config::default();
    config.paths.data = data;
    config.paths.output_dir = dir.path().join("outputs");
    config.paths.split = dir.path().join("outputs/split.json");
    config
}

#[test]
fn test_pipeline_writes_all_artifacts() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir);

    let outcome = pipeline::run_pipeline(&config).unwrap();
    let out = &outcome.output_dir;

    for name in [
        "split.json",
        "keyword_preds.jsonl",
        "tfidf_preds.jsonl",
        "tfidf_model_summary.json",
        "keyword_metrics.json",
        "keyword_metrics.md",
        "keyword_evidence_metrics.json",
        "keyword_evidence_metrics.md",
        "tfidf_metrics.json",
        "tfidf_metrics.md",
        "tfidf_evidence_metrics.json",
        "tfidf_evidence_metrics.md",
        "dataset_stats.json",
        "label_distribution.json",
    ] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }

    let names: Vec<&str> = outcome.predictors.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["keyword", "tfidf"]);
}

#[test]
fn test_pipeline_uses_time_split_and_evaluates_test_only() {
    let dir = tempdir().unwrap();
    let outcome = pipeline::run_pipeline(&config_for(&dir)).unwrap();

    assert_eq!(outcome.split.strategy, SplitStrategy::Time);
    assert_eq!(outcome.split.test, ["ift-4"]);
    assert_eq!(outcome.stats.n_total, 6);
    assert_eq!(outcome.stats.n_labeled, 5);

    for predictor in &outcome.predictors {
        assert_eq!(predictor.labels.n, 1);
        assert_eq!(predictor.labels.fields.len(), 4);
        assert_eq!(predictor.evidence.n_incidents, 1);
    }

    let predictions = io::load_predictions(outcome.output_dir.join("keyword_preds.jsonl")).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].incident_id, "ift-4");
}

#[test]
fn test_keyword_predictor_on_held_out_incident() {
    let dir = tempdir().unwrap();
    let outcome = pipeline::run_pipeline(&config_for(&dir)).unwrap();
    let keyword = &outcome.predictors[0];

    let impact = keyword.labels.fields.get(Field::Impact).unwrap();
    let success = impact.label("mission_success_with_anomaly").unwrap();
    assert_eq!(success.support, 1);
    assert_eq!(success.f1, 1.0);

    // "tiles" and "heat shield" both sit in sentence 0
    assert_eq!(keyword.evidence.overall.metrics.precision_at_1, 1.0);
    assert_eq!(keyword.evidence.overall.metrics.recall_at_1, 1.0);
    assert_eq!(keyword.evidence.overall.coverage, 1.0);
}

#[test]
fn test_baseline_summary_reflects_train_partition() {
    let dir = tempdir().unwrap();
    let outcome = pipeline::run_pipeline(&config_for(&dir)).unwrap();

    let summary: BaselineSummary =
        io::read_json(outcome.output_dir.join("tfidf_model_summary.json")).unwrap();
    assert_eq!(summary.n_train, 4);
    assert!(summary.n_features > 0);

    let impact = summary.fields.get(Field::Impact).unwrap();
    assert_eq!(impact.always_on, ["vehicle_loss"]);
    assert!(impact.inert.contains(&"delay".to_string()));

    let tfidf = &outcome.predictors[1];
    let vehicle_loss = tfidf
        .labels
        .fields
        .get(Field::Impact)
        .unwrap()
        .label("vehicle_loss")
        .unwrap();
    // predicted on the held-out incident without gold support
    assert_eq!(vehicle_loss.support, 0);
    assert_eq!(vehicle_loss.precision, 0.0);
}

#[test]
fn test_pipeline_is_reproducible() {
    let first_dir = tempdir().unwrap();
    let second_dir = tempdir().unwrap();

    let first = pipeline::run_pipeline(&config_for(&first_dir)).unwrap();
    let second = pipeline::run_pipeline(&config_for(&second_dir)).unwrap();

    assert_eq!(first.split, second.split);
    let read = |dir: &std::path::Path| std::fs::read_to_string(dir.join("tfidf_preds.jsonl")).unwrap();
    assert_eq!(read(&first.output_dir), read(&second.output_dir));
}

#[test]
fn test_pipeline_missing_data_is_error() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.paths.data = dir.path().join("absent.jsonl");
    config.paths.output_dir = dir.path().join("outputs");

    assert!(pipeline::run_pipeline(&config).is_err());
}
