use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the dataset preparer.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("failed to load dataset {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    DataQuality(#[from] DataQualityError),

    #[error("invalid preparation config: {0}")]
    InvalidConfig(String),

    #[error("failed to write partition {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PrepareError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Schema and content problems detected after the file parsed cleanly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataQualityError {
    #[error("required column `{column}` is missing from the input header")]
    MissingColumn { column: String },

    #[error("column `{column}` has no numeric values to compute a fill value from")]
    NoNumericValues { column: String },
}

pub type Result<T> = std::result::Result<T, PrepareError>;
