//! Churn model pipeline
//!
//! Glue between the dataset preparer and an external managed ML platform:
//! configuration, collaborator traits, a filesystem object store, an HTTP
//! prediction client and the stage-by-stage orchestration.

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod platform;
pub mod predict;
pub mod store;

pub use config::{resolve_bucket, PipelineConfig};
pub use errors::{Collaborator, PipelineError, Result};
pub use pipeline::{prepare_dataset, ChurnPipeline, PipelineReport};
pub use platform::{
    DeploymentBackend, Endpoint, Hyperparameters, InstanceSpec, ObjectLocation, ObjectStore,
    PredictionClient, TrainingBackend, TrainingChannel, TrainingJob, TrainingRequest,
};
pub use predict::{load_test_features, smoke_test, HttpPredictionClient, DEFAULT_SMOKE_TEST_ROWS};
pub use store::FsObjectStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
