//! End-to-end pipeline orchestration
//!
//! prepare -> upload train/validation -> train -> deploy -> smoke test.
//! Stages run strictly in order; the first failure is logged and returned
//! and nothing is retried.

use churn_prep::{PartitionKind, PrepareConfig, PreparedDataset};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::platform::{
    DeploymentBackend, Endpoint, ObjectLocation, ObjectStore, PredictionClient, TrainingBackend,
    TrainingJob, TrainingRequest,
};
use crate::predict::{smoke_test, DEFAULT_SMOKE_TEST_ROWS};

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub prepared: PreparedDataset,
    pub train_location: ObjectLocation,
    pub validation_location: ObjectLocation,
    pub job: TrainingJob,
    pub endpoint: Endpoint,
    pub predictions: Vec<Value>,
}

pub struct ChurnPipeline {
    store: Arc<dyn ObjectStore>,
    trainer: Arc<dyn TrainingBackend>,
    deployer: Arc<dyn DeploymentBackend>,
    predictor: Arc<dyn PredictionClient>,
    smoke_test_rows: usize,
}

impl ChurnPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        trainer: Arc<dyn TrainingBackend>,
        deployer: Arc<dyn DeploymentBackend>,
        predictor: Arc<dyn PredictionClient>,
    ) -> Self {
        Self {
            store,
            trainer,
            deployer,
            predictor,
            smoke_test_rows: DEFAULT_SMOKE_TEST_ROWS,
        }
    }

    pub fn with_smoke_test_rows(mut self, rows: usize) -> Self {
        self.smoke_test_rows = rows;
        self
    }

    pub async fn run(
        &self,
        config: &PipelineConfig,
        prepare: PrepareConfig,
    ) -> Result<PipelineReport> {
        info!("Starting pipeline...");
        let report = self.run_stages(config, prepare).await.inspect_err(|err| {
            error!(error = %err, "Pipeline failed");
        })?;
        info!(
            job = %report.job.name,
            endpoint = %report.endpoint.name,
            predictions = report.predictions.len(),
            "Pipeline completed"
        );
        Ok(report)
    }

    async fn run_stages(
        &self,
        config: &PipelineConfig,
        prepare: PrepareConfig,
    ) -> Result<PipelineReport> {
        let prepared = prepare_dataset(prepare).await?;
        info!(
            train = prepared.train_rows,
            validation = prepared.validation_rows,
            test = prepared.test_rows,
            "Preprocessing completed"
        );

        let train_location = self
            .upload_partition(&prepared, PartitionKind::Train, &config.bucket)
            .await?;
        let validation_location = self
            .upload_partition(&prepared, PartitionKind::Validation, &config.bucket)
            .await?;

        let request =
            TrainingRequest::new(config, train_location.clone(), validation_location.clone());
        info!(
            algorithm = %request.algorithm,
            instance_type = %request.instance.instance_type,
            output = %request.output_uri,
            "Starting training job..."
        );
        let job = self.trainer.train(&request).await?;
        info!(job = %job.name, "Training job completed");

        let endpoint = self.deployer.deploy(&job, &request.instance).await?;
        info!(endpoint = %endpoint.name, "Deployed endpoint");

        let predictions = smoke_test(
            self.predictor.as_ref(),
            &endpoint,
            &prepared.paths.test,
            self.smoke_test_rows,
        )
        .await?;

        Ok(PipelineReport {
            prepared,
            train_location,
            validation_location,
            job,
            endpoint,
            predictions,
        })
    }

    async fn upload_partition(
        &self,
        prepared: &PreparedDataset,
        kind: PartitionKind,
        bucket: &str,
    ) -> Result<ObjectLocation> {
        self.store
            .upload(prepared.paths.get(kind), kind.name(), bucket)
            .await
    }
}

/// Run the synchronous preparer off the async runtime.
pub async fn prepare_dataset(config: PrepareConfig) -> Result<PreparedDataset> {
    let prepared = tokio::task::spawn_blocking(move || churn_prep::prepare(&config)).await??;
    Ok(prepared)
}
