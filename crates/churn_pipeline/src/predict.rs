//! Prediction client and smoke test
//!
//! The endpoint takes one CSV feature row per request and answers with JSON.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{Collaborator, PipelineError, Result};
use crate::platform::{Endpoint, PredictionClient, CSV_CONTENT_TYPE};

/// Rows scored by the smoke test unless told otherwise.
pub const DEFAULT_SMOKE_TEST_ROWS: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Invokes endpoints at `{base_url}/endpoints/{name}/invocations`.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn invocation_url(&self, endpoint: &Endpoint) -> String {
        format!("{}/endpoints/{}/invocations", self.base_url, endpoint.name)
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, endpoint: &Endpoint, csv_row: &str) -> Result<Value> {
        let response = self
            .client
            .post(self.invocation_url(endpoint))
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(csv_row.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                Collaborator::Prediction,
                format!("endpoint {} returned {status}: {body}", endpoint.name),
            ));
        }

        let value: Value = response.json().await?;
        debug!(endpoint = %endpoint.name, prediction = %value, "Received prediction");
        Ok(value)
    }
}

/// Feature rows of a prepared test partition: column 0 (the target) dropped,
/// remaining fields comma-joined. At most `limit` rows are returned.
pub async fn load_test_features(path: &Path, limit: usize) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await.map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for record in reader.records().take(limit) {
        let record = record.map_err(|err| PipelineError::TestData {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if record.len() < 2 {
            return Err(PipelineError::TestData {
                path: path.to_path_buf(),
                reason: format!(
                    "row has {} field(s), expected a target and features",
                    record.len()
                ),
            });
        }
        rows.push(record.iter().skip(1).collect::<Vec<_>>().join(","));
    }
    Ok(rows)
}

/// Score the first `limit` rows of the test partition against `endpoint`.
pub async fn smoke_test(
    client: &dyn PredictionClient,
    endpoint: &Endpoint,
    test_csv: &Path,
    limit: usize,
) -> Result<Vec<Value>> {
    let rows = load_test_features(test_csv, limit).await?;
    info!(endpoint = %endpoint.name, rows = rows.len(), "Running prediction smoke test");

    let mut predictions = Vec::with_capacity(rows.len());
    for row in &rows {
        predictions.push(client.predict(endpoint, row).await?);
    }

    info!(
        endpoint = %endpoint.name,
        predictions = predictions.len(),
        "Prediction smoke test completed"
    );
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_url_trims_trailing_slash() {
        let client =
            HttpPredictionClient::with_client(reqwest::Client::new(), "http://localhost:8080/");
        assert_eq!(
            client.invocation_url(&Endpoint::new("churn-xgb")),
            "http://localhost:8080/endpoints/churn-xgb/invocations"
        );
    }

    #[tokio::test]
    async fn test_load_test_features_drops_target() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.csv");
        std::fs::write(&path, "1,0,43.4,\n0,1,29.85,12\n0,1,56.95,3\n")?;

        let rows = load_test_features(&path, 2).await?;
        assert_eq!(rows, vec!["0,43.4,", "1,29.85,12"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_test_features_empty_partition() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.csv");
        std::fs::write(&path, "")?;

        assert!(load_test_features(&path, 10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_test_features_rejects_target_only_rows() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.csv");
        std::fs::write(&path, "1\n")?;

        let err = load_test_features(&path, 10).await.unwrap_err();
        assert!(matches!(err, PipelineError::TestData { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_test_features_missing_file() {
        let err = load_test_features(Path::new("/no/such/test.csv"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
