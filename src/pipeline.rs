//! Run orchestration shared by the CLI subcommands
//!
//! Each step reads its inputs fully, computes, then writes its artifacts.

use crate::baselines::{KeywordScorer, LabelPredictor};
use crate::config::Config;
use crate::dataset::{dataset_stats, label_distribution, DatasetSplitter, DatasetStats, SplitRecord};
use crate::error::Result;
use crate::eval::{
    evidence_report_markdown, label_report_markdown, EvidenceEvaluator, EvidenceReport,
    LabelEvaluator, LabelReport,
};
use crate::io;
use crate::ml::{BaselineConfig, FittedBaseline, StatisticalBaseline};
use crate::models::{IncidentRecord, LabelSchema, PredictionRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Records whose id is in `ids`, in input order
pub fn select<'a>(records: &'a [IncidentRecord], ids: &BTreeSet<String>) -> Vec<&'a IncidentRecord> {
    records
        .iter()
        .filter(|r| ids.contains(&r.incident_id))
        .collect()
}

/// Split the labeled incidents and write the split file
pub fn run_split(
    records: &[IncidentRecord],
    splitter: &DatasetSplitter,
    out: impl AsRef<Path>,
) -> Result<SplitRecord> {
    let split = splitter.split(records);
    io::write_json_pretty(out, &split)?;
    Ok(split)
}

pub fn load_split(path: impl AsRef<Path>) -> Result<SplitRecord> {
    io::read_json(path)
}

/// Run a predictor over records and write the prediction stream
pub fn run_predictor(
    predictor: &dyn LabelPredictor,
    records: &[&IncidentRecord],
    out: impl AsRef<Path>,
) -> Result<Vec<PredictionRecord>> {
    let predictions = predictor.predict_all(records)?;
    io::write_jsonl(out, &predictions)?;
    info!(
        predictor = predictor.name(),
        n = predictions.len(),
        "Wrote predictions"
    );
    Ok(predictions)
}

/// Keyword predictions for the test partition, or every record without a split
pub fn run_keyword(
    records: &[IncidentRecord],
    scorer: &KeywordScorer,
    split: Option<&SplitRecord>,
    out: impl AsRef<Path>,
) -> Result<Vec<PredictionRecord>> {
    let targets = match split {
        Some(split) => select(records, &split.test_ids()),
        None => records.iter().collect(),
    };
    run_predictor(scorer, &targets, out)
}

/// Fit the statistical baseline and predict.
///
/// With a split it fits on train and predicts on test. Without one it fits
/// on every labeled incident and predicts on every incident with text.
pub fn run_baseline(
    records: &[IncidentRecord],
    schema: &LabelSchema,
    config: &BaselineConfig,
    split: Option<&SplitRecord>,
    out: impl AsRef<Path>,
) -> Result<(FittedBaseline, Vec<PredictionRecord>)> {
    let (train, test) = match split {
        Some(split) => (
            select(records, &split.train_ids()),
            select(records, &split.test_ids()),
        ),
        None => (
            records.iter().filter(|r| r.is_labeled()).collect(),
            records.iter().filter(|r| r.has_text()).collect(),
        ),
    };

    let fitted = StatisticalBaseline::new(schema.clone(), config.clone())?.fit(&train)?;
    let predictions = run_predictor(&fitted, &test, out)?;
    Ok((fitted, predictions))
}

/// Label metrics as JSON and Markdown
pub fn evaluate_labels(
    gold: &BTreeMap<String, IncidentRecord>,
    predictions: &BTreeMap<String, PredictionRecord>,
    schema: &LabelSchema,
    restrict: Option<&BTreeSet<String>>,
    json_out: impl AsRef<Path>,
    md_out: impl AsRef<Path>,
) -> Result<LabelReport> {
    let report = LabelEvaluator::new(schema.clone()).evaluate(gold, predictions, restrict);
    io::write_json_pretty(json_out, &report)?;
    io::write_text(md_out, &label_report_markdown(&report))?;
    Ok(report)
}

/// Evidence metrics as JSON and Markdown
pub fn evaluate_evidence(
    gold: &BTreeMap<String, IncidentRecord>,
    predictions: &BTreeMap<String, PredictionRecord>,
    restrict: Option<&BTreeSet<String>>,
    json_out: impl AsRef<Path>,
    md_out: impl AsRef<Path>,
) -> Result<EvidenceReport> {
    let report = EvidenceEvaluator::new().evaluate(gold, predictions, restrict);
    io::write_json_pretty(json_out, &report)?;
    io::write_text(md_out, &evidence_report_markdown(&report))?;
    Ok(report)
}

/// Dataset statistics and label distribution
pub fn write_stats(records: &[IncidentRecord], output_dir: &Path) -> Result<DatasetStats> {
    let stats = dataset_stats(records);
    io::write_json_pretty(output_dir.join("dataset_stats.json"), &stats)?;
    io::write_json_pretty(
        output_dir.join("label_distribution.json"),
        &label_distribution(records),
    )?;
    Ok(stats)
}

/// Metrics produced for one predictor
#[derive(Debug, Clone)]
pub struct PredictorOutcome {
    pub name: String,
    pub labels: LabelReport,
    pub evidence: EvidenceReport,
}

/// Everything a full pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub split: SplitRecord,
    pub stats: DatasetStats,
    pub predictors: Vec<PredictorOutcome>,
    pub output_dir: PathBuf,
}

/// Split, predict with both baselines on the test partition, evaluate, and
/// write dataset statistics
pub fn run_pipeline(config: &Config) -> Result<PipelineOutcome> {
    let records = io::load_incidents(&config.paths.data)?;
    let schema = config.label_schema()?;
    let out_dir = config.paths.output_dir.as_path();
    info!(
        path = %config.paths.data.display(),
        n_records = records.len(),
        "Loaded incidents"
    );

    let splitter = DatasetSplitter::new(config.split.seed, config.split.test_size)?;
    let split = run_split(&records, &splitter, out_dir.join("split.json"))?;
    let test_ids = split.test_ids();

    let scorer = KeywordScorer::new(config.keyword_table()?, schema.clone())
        .with_max_evidence(config.keywords.max_evidence);
    let keyword = run_keyword(&records, &scorer, Some(&split), out_dir.join("keyword_preds.jsonl"))?;

    let (fitted, tfidf) = run_baseline(
        &records,
        &schema,
        &config.baseline,
        Some(&split),
        out_dir.join("tfidf_preds.jsonl"),
    )?;
    io::write_json_pretty(out_dir.join("tfidf_model_summary.json"), &fitted.summary())?;

    let gold = io::index_by_id(records.clone(), |r| r.incident_id.as_str());
    let mut predictors = Vec::new();
    for (name, predictions) in [(scorer.name(), keyword), (fitted.name(), tfidf)] {
        let predictions = io::index_by_id(predictions, |p| p.incident_id.as_str());
        let labels = evaluate_labels(
            &gold,
            &predictions,
            &schema,
            Some(&test_ids),
            out_dir.join(format!("{}_metrics.json", name)),
            out_dir.join(format!("{}_metrics.md", name)),
        )?;
        let evidence = evaluate_evidence(
            &gold,
            &predictions,
            Some(&test_ids),
            out_dir.join(format!("{}_evidence_metrics.json", name)),
            out_dir.join(format!("{}_evidence_metrics.md", name)),
        )?;
        predictors.push(PredictorOutcome {
            name: name.to_string(),
            labels,
            evidence,
        });
    }

    let stats = write_stats(&records, out_dir)?;

    info!(
        output_dir = %out_dir.display(),
        strategy = %split.strategy,
        n_train = split.train.len(),
        n_test = split.test.len(),
        "Pipeline complete"
    );

    Ok(PipelineOutcome {
        split,
        stats,
        predictors,
        output_dir: out_dir.to_path_buf(),
    })
}
