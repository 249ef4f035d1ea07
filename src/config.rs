//! Run configuration: where the data lives and how the model is built.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::split::DEFAULT_TEST_RATIO;
use crate::features::FeatureEncoder;
use crate::knn::DEFAULT_K;
use crate::labels::LabelTable;

/// Dataset read when no path is given.
pub const DEFAULT_DATASET: &str = "dataset_manual.csv";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("number of neighbours must be at least 1")]
    ZeroNeighbors,
    #[error("test ratio must be in [0, 1), got {0}")]
    TestRatio(f64),
}

/// Test ratios must lie in `[0, 1)`.
pub fn check_test_ratio(test_ratio: f64) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&test_ratio) {
        Ok(())
    } else {
        Err(ConfigError::TestRatio(test_ratio))
    }
}

/// Everything a run needs besides its I/O handles.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset: PathBuf,
    /// Neighbours consulted per prediction.
    pub k: usize,
    /// Fraction of each label held out for evaluation.
    pub test_ratio: f64,
    /// Fixed seed for noise and shuffling; entropy when `None`.
    pub seed: Option<u64>,
    pub encoder: FeatureEncoder,
    pub labels: LabelTable,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dataset: PathBuf::from(DEFAULT_DATASET),
            k: DEFAULT_K,
            test_ratio: DEFAULT_TEST_RATIO,
            seed: None,
            encoder: FeatureEncoder::default(),
            labels: LabelTable::reference(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::ZeroNeighbors);
        }
        check_test_ratio(self.test_ratio)
    }
}
