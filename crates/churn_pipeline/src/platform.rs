//! Managed ML platform interface
//!
//! The training and hosting service is external. This module fixes the
//! shapes exchanged with it and the traits each collaborator implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::errors::Result;

/// Key prefix for uploaded partitions.
pub const DATA_PREFIX: &str = "churn-data";
/// Key prefix for training output.
pub const OUTPUT_PREFIX: &str = "output";
/// Content type of every training channel and prediction request.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Object in a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Deterministic destination for a logical dataset name.
    pub fn for_dataset(bucket: &str, logical_name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: format!("{DATA_PREFIX}/{logical_name}.csv"),
        }
    }

    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Boosting configuration sent with every training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub objective: String,
    pub num_round: u32,
    pub max_depth: u32,
    pub eta: f64,
    pub subsample: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            objective: "binary:logistic".to_string(),
            num_round: 100,
            max_depth: 5,
            eta: 0.2,
            subsample: 0.8,
        }
    }
}

impl Hyperparameters {
    /// String map in the form platform APIs accept.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("objective".to_string(), self.objective.clone()),
            ("num_round".to_string(), self.num_round.to_string()),
            ("max_depth".to_string(), self.max_depth.to_string()),
            ("eta".to_string(), self.eta.to_string()),
            ("subsample".to_string(), self.subsample.to_string()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub count: u32,
    pub instance_type: String,
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            count: 1,
            instance_type: "ml.t2.medium".to_string(),
        }
    }
}

/// Named training input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingChannel {
    pub name: String,
    pub location: ObjectLocation,
    pub content_type: String,
}

impl TrainingChannel {
    pub fn csv(name: &str, location: ObjectLocation) -> Self {
        Self {
            name: name.to_string(),
            location,
            content_type: CSV_CONTENT_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    /// Built-in algorithm image family.
    pub algorithm: String,
    pub role_arn: String,
    pub region: String,
    pub channels: Vec<TrainingChannel>,
    pub output_uri: String,
    pub instance: InstanceSpec,
    pub hyperparameters: Hyperparameters,
}

impl TrainingRequest {
    pub fn new(config: &PipelineConfig, train: ObjectLocation, validation: ObjectLocation) -> Self {
        Self {
            algorithm: "xgboost".to_string(),
            role_arn: config.role_arn.clone(),
            region: config.region.clone(),
            channels: vec![
                TrainingChannel::csv("train", train),
                TrainingChannel::csv("validation", validation),
            ],
            output_uri: format!("s3://{}/{OUTPUT_PREFIX}", config.bucket),
            instance: InstanceSpec::default(),
            hyperparameters: Hyperparameters::default(),
        }
    }

    pub fn channel(&self, name: &str) -> Option<&TrainingChannel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// Handle to a completed training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub name: String,
    pub model_artifact: Option<String>,
}

/// Handle to a deployed inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Make `local_path` retrievable at `ObjectLocation::for_dataset(bucket, logical_name)`.
    async fn upload(
        &self,
        local_path: &Path,
        logical_name: &str,
        bucket: &str,
    ) -> Result<ObjectLocation>;
}

#[async_trait]
pub trait TrainingBackend: Send + Sync {
    /// Run a training job to completion.
    async fn train(&self, request: &TrainingRequest) -> Result<TrainingJob>;
}

#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    async fn deploy(&self, job: &TrainingJob, instance: &InstanceSpec) -> Result<Endpoint>;
}

#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Score one comma-joined feature row.
    async fn predict(&self, endpoint: &Endpoint, csv_row: &str) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig {
            bucket: "churn-bucket".into(),
            role_arn: "arn:aws:iam::1:role/churn".into(),
            region: "eu-west-1".into(),
        }
    }

    #[test]
    fn test_dataset_location() {
        let location = ObjectLocation::for_dataset("churn-bucket", "train");
        assert_eq!(location.key, "churn-data/train.csv");
        assert_eq!(location.to_string(), "s3://churn-bucket/churn-data/train.csv");
    }

    #[test]
    fn test_training_request_shape() {
        let request = TrainingRequest::new(
            &config(),
            ObjectLocation::for_dataset("churn-bucket", "train"),
            ObjectLocation::for_dataset("churn-bucket", "validation"),
        );

        assert_eq!(request.output_uri, "s3://churn-bucket/output");
        assert_eq!(request.instance.count, 1);
        assert_eq!(request.instance.instance_type, "ml.t2.medium");
        let validation = request.channel("validation").unwrap();
        assert_eq!(validation.content_type, "text/csv");
        assert_eq!(validation.location.key, "churn-data/validation.csv");
        assert!(request.channel("test").is_none());
    }

    #[test]
    fn test_fixed_hyperparameters() {
        let params = Hyperparameters::default().to_map();
        assert_eq!(params["objective"], "binary:logistic");
        assert_eq!(params["num_round"], "100");
        assert_eq!(params["max_depth"], "5");
        assert_eq!(params["eta"], "0.2");
        assert_eq!(params["subsample"], "0.8");
    }
}
