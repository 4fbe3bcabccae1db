use anyhow::Context;
use clap::{Parser, Subcommand};
use incident_tagger::{
    baselines::KeywordScorer,
    config::{Config, ObservabilityConfig},
    dataset::DatasetSplitter,
    io,
    models::LabelSchema,
    pipeline, AppError,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "incident-tagger")]
#[command(version, about = "Evidence-grounded multi-label tagging and evaluation for incident narratives", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "INCIDENT_TAGGER_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a deterministic train/test split of the labeled incidents
    Split {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        test_size: Option<f64>,
    },

    /// Predict with the keyword baseline
    Keyword {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Keyword table (YAML)
        #[arg(short, long)]
        table: Option<PathBuf>,

        /// Only predict the test partition of this split
        #[arg(long)]
        split: Option<PathBuf>,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Fit the TF-IDF baseline and predict
    Baseline {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Fit on train and predict on test of this split
        #[arg(long)]
        split: Option<PathBuf>,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Score predicted labels against gold labels
    Evaluate {
        #[arg(short, long)]
        gold: Option<PathBuf>,

        #[arg(short, long)]
        pred: PathBuf,

        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Restrict to the test partition of this split
        #[arg(long)]
        split: Option<PathBuf>,

        #[arg(short, long, default_value = "outputs/metrics.json")]
        out: PathBuf,

        #[arg(long, default_value = "outputs/metrics.md")]
        md_out: PathBuf,
    },

    /// Score predicted evidence sentences against gold evidence
    Evidence {
        #[arg(short, long)]
        gold: Option<PathBuf>,

        #[arg(short, long)]
        pred: PathBuf,

        /// Restrict to the test partition of this split
        #[arg(long)]
        split: Option<PathBuf>,

        #[arg(short, long, default_value = "outputs/evidence_metrics.json")]
        out: PathBuf,

        #[arg(long, default_value = "outputs/evidence_metrics.md")]
        md_out: PathBuf,
    },

    /// Dataset size, label distribution and summary statistics
    Stats {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Split, run both baselines, evaluate, and write statistics
    Pipeline {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        schema: Option<PathBuf>,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

fn init_tracing(observability: &ObservabilityConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json || observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn schema_for(config: &Config, schema: Option<PathBuf>) -> anyhow::Result<LabelSchema> {
    match schema {
        Some(path) => LabelSchema::load(&path)
            .with_context(|| format!("Failed to load schema {}", path.display())),
        None => config.label_schema().context("Failed to load label schema"),
    }
}

fn test_ids(split: Option<&Path>) -> anyhow::Result<Option<BTreeSet<String>>> {
    split
        .map(|path| {
            pipeline::load_split(path)
                .map(|s| s.test_ids())
                .with_context(|| format!("Failed to read split {}", path.display()))
        })
        .transpose()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.observability, cli.json_logs);

    tracing::info!("incident-tagger v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli.command, config) {
        match err.downcast_ref::<AppError>() {
            Some(app) => tracing::error!(
                code = app.error_code(),
                input = app.is_fatal_input(),
                "{:#}",
                err
            ),
            None => tracing::error!("{:#}", err),
        }
        return Err(err);
    }
    Ok(())
}

fn run(command: Commands, mut config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Split {
            data,
            out,
            seed,
            test_size,
        } => {
            let data = data.unwrap_or(config.paths.data);
            let out = out.unwrap_or(config.paths.split);
            let splitter = DatasetSplitter::new(
                seed.unwrap_or(config.split.seed),
                test_size.unwrap_or(config.split.test_size),
            )?;

            let records = io::load_incidents(&data)
                .with_context(|| format!("Failed to read incidents {}", data.display()))?;
            let split = pipeline::run_split(&records, &splitter, &out)?;
            tracing::info!(
                path = %out.display(),
                strategy = %split.strategy,
                n_train = split.train.len(),
                n_test = split.test.len(),
                "Saved split"
            );
        }

        Commands::Keyword {
            data,
            schema,
            table,
            split,
            out,
        } => {
            if table.is_some() {
                config.keywords.table = table;
            }
            let schema = schema_for(&config, schema)?;
            let data = data.unwrap_or(config.paths.data.clone());
            let records = io::load_incidents(&data)
                .with_context(|| format!("Failed to read incidents {}", data.display()))?;
            let split = split.as_deref().map(pipeline::load_split).transpose()?;

            let scorer = KeywordScorer::new(config.keyword_table()?, schema)
                .with_max_evidence(config.keywords.max_evidence);
            pipeline::run_keyword(&records, &scorer, split.as_ref(), &out)?;
        }

        Commands::Baseline {
            data,
            schema,
            split,
            threshold,
            out,
        } => {
            if let Some(threshold) = threshold {
                config.baseline.threshold = threshold;
            }
            let schema = schema_for(&config, schema)?;
            let data = data.unwrap_or(config.paths.data.clone());
            let records = io::load_incidents(&data)
                .with_context(|| format!("Failed to read incidents {}", data.display()))?;
            let split = split.as_deref().map(pipeline::load_split).transpose()?;

            let (fitted, _) =
                pipeline::run_baseline(&records, &schema, &config.baseline, split.as_ref(), &out)?;
            let summary_path = out.with_extension("summary.json");
            io::write_json_pretty(&summary_path, &fitted.summary())?;
        }

        Commands::Evaluate {
            gold,
            pred,
            schema,
            split,
            out,
            md_out,
        } => {
            let schema = schema_for(&config, schema)?;
            let gold = gold.unwrap_or(config.paths.data.clone());
            let gold = io::index_by_id(io::load_incidents(&gold)?, |r| r.incident_id.as_str());
            let predictions =
                io::index_by_id(io::load_predictions(&pred)?, |p| p.incident_id.as_str());
            let restrict = test_ids(split.as_deref())?;

            let report = pipeline::evaluate_labels(
                &gold,
                &predictions,
                &schema,
                restrict.as_ref(),
                &out,
                &md_out,
            )?;
            tracing::info!(n = report.n, n_fields = report.fields.len(), "Saved label metrics");
        }

        Commands::Evidence {
            gold,
            pred,
            split,
            out,
            md_out,
        } => {
            let gold = gold.unwrap_or(config.paths.data.clone());
            let gold = io::index_by_id(io::load_incidents(&gold)?, |r| r.incident_id.as_str());
            let predictions =
                io::index_by_id(io::load_predictions(&pred)?, |p| p.incident_id.as_str());
            let restrict = test_ids(split.as_deref())?;

            let report =
                pipeline::evaluate_evidence(&gold, &predictions, restrict.as_ref(), &out, &md_out)?;
            tracing::info!(
                n_incidents = report.n_incidents,
                coverage = report.overall.coverage,
                "Saved evidence metrics"
            );
        }

        Commands::Stats { data, out_dir } => {
            let data = data.unwrap_or(config.paths.data.clone());
            let out_dir = out_dir.unwrap_or(config.paths.output_dir.clone());
            let records = io::load_incidents(&data)
                .with_context(|| format!("Failed to read incidents {}", data.display()))?;
            let stats = pipeline::write_stats(&records, &out_dir)?;
            tracing::info!(
                n_total = stats.n_total,
                n_labeled = stats.n_labeled,
                "Saved dataset stats"
            );
        }

        Commands::Pipeline {
            data,
            schema,
            out_dir,
        } => {
            if let Some(data) = data {
                config.paths.data = data;
            }
            if schema.is_some() {
                config.paths.schema = schema;
            }
            if let Some(out_dir) = out_dir {
                config.paths.output_dir = out_dir;
            }

            let outcome = pipeline::run_pipeline(&config)?;
            for predictor in &outcome.predictors {
                for (field, metrics) in predictor.labels.fields.iter() {
                    tracing::info!(
                        predictor = %predictor.name,
                        field = %field,
                        micro_f1 = metrics.micro_f1,
                        macro_f1 = metrics.macro_f1,
                        "Label metrics"
                    );
                }
                tracing::info!(
                    predictor = %predictor.name,
                    coverage = predictor.evidence.overall.coverage,
                    recall_at_3 = predictor.evidence.overall.metrics.recall_at_3,
                    "Evidence metrics"
                );
            }
        }
    }

    Ok(())
}
