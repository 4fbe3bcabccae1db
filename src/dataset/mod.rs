//! Dataset partitioning and corpus statistics

pub mod rng;
pub mod split;
pub mod stats;

pub use rng::SeededRng;
pub use split::{test_count, DatasetSplitter, SplitRecord, SplitStrategy};
pub use stats::{dataset_stats, label_distribution, DatasetStats, LabelDistribution};
