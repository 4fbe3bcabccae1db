use crate::baselines::KeywordTable;
use crate::error::Result;
use crate::ml::BaselineConfig;
use crate::models::LabelSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Environment variable prefix; nested keys use `__`, e.g. `INCIDENT_TAGGER_SPLIT__SEED`
pub const ENV_PREFIX: &str = "INCIDENT_TAGGER";

/// Main run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Train/test split
    #[serde(default)]
    #[validate(nested)]
    pub split: SplitConfig,

    /// Keyword scorer
    #[serde(default)]
    pub keywords: KeywordsConfig,

    /// Statistical baseline
    #[serde(default)]
    #[validate(nested)]
    pub baseline: BaselineConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration: embedded defaults, then the optional file, then
    /// environment variables
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            file,
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/default.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = file {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Label schema from the configured file, or the keyword table's label space
    pub fn label_schema(&self) -> Result<LabelSchema> {
        match &self.paths.schema {
            Some(path) => LabelSchema::load(path),
            None => Ok(self.keyword_table()?.label_schema()),
        }
    }

    /// Keyword table from the configured file, or the built-in table
    pub fn keyword_table(&self) -> Result<KeywordTable> {
        match &self.keywords.table {
            Some(path) => KeywordTable::load(path),
            None => Ok(KeywordTable::builtin()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Incident records (JSONL)
    #[serde(default = "default_data_path")]
    pub data: PathBuf,

    /// Label schema (YAML); the keyword table's labels when unset
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Split file read by training and evaluation, written by `split`
    #[serde(default = "default_split_path")]
    pub split: PathBuf,

    /// Directory for predictions, metrics and reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data: default_data_path(),
            schema: None,
            split: default_split_path(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SplitConfig {
    /// Shuffle seed for the random strategy
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fraction of labeled incidents held out
    #[serde(default = "default_test_size")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_size: default_test_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Keyword table (YAML); the built-in table when unset
    #[serde(default)]
    pub table: Option<PathBuf>,

    /// Evidence sentences kept per label
    #[serde(default = "default_max_evidence")]
    pub max_evidence: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            table: None,
            max_evidence: default_max_evidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_data_path() -> PathBuf {
    PathBuf::from("data/processed/incidents.jsonl")
}

fn default_split_path() -> PathBuf {
    PathBuf::from("outputs/split.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_seed() -> u64 {
    13
}

fn default_test_size() -> f64 {
    0.2
}

fn default_max_evidence() -> usize {
    3
}

fn default_log_level() -> String {
    "incident_tagger=info".to_string()
}
