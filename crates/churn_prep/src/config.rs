//! Preparation settings
//!
//! Everything the preparer needs is carried in [`PrepareConfig`]; nothing is
//! read from the process environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{PrepareError, Result};

/// Seed used for both split stages unless overridden.
pub const DEFAULT_SEED: u64 = 42;

pub const DEFAULT_ID_COLUMN: &str = "customerID";
pub const DEFAULT_TARGET_COLUMN: &str = "Churn";
pub const DEFAULT_NUMERIC_COLUMN: &str = "TotalCharges";
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// What to do when the designated numeric column has no parseable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationFallback {
    /// Fail with `DataQualityError::NoNumericValues`.
    #[default]
    Reject,
    /// Fill every entry with the given constant.
    Constant(f64),
}

/// Two-stage split shape, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Share of all rows held out of training (rounded up).
    pub holdout_percent: usize,
    /// Share of the holdout that becomes the test set (rounded up).
    pub test_percent_of_holdout: usize,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            holdout_percent: 30,
            test_percent_of_holdout: 50,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> Result<()> {
        if self.holdout_percent > 100 || self.test_percent_of_holdout > 100 {
            return Err(PrepareError::InvalidConfig(format!(
                "split percentages must be within 0..=100, got holdout={} test={}",
                self.holdout_percent, self.test_percent_of_holdout
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub id_column: String,
    pub target_column: String,
    /// Column coerced to numbers with mean imputation.
    pub numeric_column: String,
    pub seed: u64,
    pub split: SplitRatios,
    pub fallback: ImputationFallback,
}

impl PrepareConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            numeric_column: DEFAULT_NUMERIC_COLUMN.to_string(),
            seed: DEFAULT_SEED,
            split: SplitRatios::default(),
            fallback: ImputationFallback::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fallback(mut self, fallback: ImputationFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_columns(
        mut self,
        id_column: impl Into<String>,
        target_column: impl Into<String>,
        numeric_column: impl Into<String>,
    ) -> Self {
        self.id_column = id_column.into();
        self.target_column = target_column.into();
        self.numeric_column = numeric_column.into();
        self
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Check internal consistency before any file is touched.
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;

        let names = [
            ("id_column", &self.id_column),
            ("target_column", &self.target_column),
            ("numeric_column", &self.numeric_column),
        ];
        for (field, name) in names {
            if name.is_empty() {
                return Err(PrepareError::InvalidConfig(format!("{field} is empty")));
            }
        }
        if self.id_column == self.target_column
            || self.id_column == self.numeric_column
            || self.target_column == self.numeric_column
        {
            return Err(PrepareError::InvalidConfig(format!(
                "identifier `{}`, target `{}` and numeric `{}` columns must be distinct",
                self.id_column, self.target_column, self.numeric_column
            )));
        }
        if let ImputationFallback::Constant(value) = self.fallback {
            if !value.is_finite() {
                return Err(PrepareError::InvalidConfig(format!(
                    "imputation fallback must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}
