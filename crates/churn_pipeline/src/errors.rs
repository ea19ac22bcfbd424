//! Pipeline error types

use churn_prep::PrepareError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// External services the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    ObjectStore,
    Training,
    Deployment,
    Prediction,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::ObjectStore => "object store",
            Collaborator::Training => "training backend",
            Collaborator::Deployment => "deployment backend",
            Collaborator::Prediction => "prediction endpoint",
        };
        f.write_str(name)
    }
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Prepare(#[from] PrepareError),

    #[error("configuration error: `{variable}` is not set")]
    Configuration { variable: String },

    #[error("{collaborator} call failed: {message}")]
    Upstream {
        collaborator: Collaborator,
        message: String,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed test partition {}: {reason}", .path.display())]
    TestData { path: PathBuf, reason: String },

    #[error("background task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn upstream(collaborator: Collaborator, message: impl fmt::Display) -> Self {
        PipelineError::Upstream {
            collaborator,
            message: message.to_string(),
        }
    }

    pub fn missing(variable: impl Into<String>) -> Self {
        PipelineError::Configuration {
            variable: variable.into(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::upstream(Collaborator::Prediction, err)
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
