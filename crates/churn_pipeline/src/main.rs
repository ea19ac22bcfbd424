//! Churn pipeline CLI
//!
//! Runs the locally executable stages: dataset preparation, uploading the
//! processed partitions and the prediction smoke test. `check-config`
//! resolves the platform settings the training stages would use.

use anyhow::{Context, Result};
use churn_pipeline::{
    config::env_lookup, resolve_bucket, smoke_test, Endpoint, FsObjectStore, HttpPredictionClient,
    ObjectStore, PipelineConfig, DEFAULT_SMOKE_TEST_ROWS,
};
use churn_prep::{PartitionKind, PrepareConfig, DEFAULT_SEED};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "churn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer churn prediction pipeline", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean, encode and split the raw dataset
    Prepare {
        /// Input CSV path
        #[arg(long, default_value = "data/telco_churn.csv")]
        input_csv: PathBuf,

        /// Directory for train.csv, validation.csv and test.csv
        #[arg(long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// Seed for the train/validation/test split
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Upload the processed train and validation partitions
    Upload {
        /// Directory holding the processed partitions
        #[arg(long, default_value = "data/processed")]
        processed_dir: PathBuf,

        /// Root directory of the filesystem object store
        #[arg(long)]
        store_root: PathBuf,

        /// Bucket name (overrides S3_BUCKET)
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Send test rows to a deployed endpoint
    SmokeTest {
        /// Endpoint name
        #[arg(long)]
        endpoint_name: String,

        /// Base URL of the inference runtime
        #[arg(long)]
        base_url: String,

        /// Processed test partition
        #[arg(long, default_value = "data/processed/test.csv")]
        test_csv: PathBuf,

        /// Number of rows to score
        #[arg(long, default_value_t = DEFAULT_SMOKE_TEST_ROWS)]
        limit: usize,
    },
    /// Resolve and print the platform configuration
    CheckConfig {
        /// Bucket name (overrides S3_BUCKET)
        #[arg(long)]
        bucket: Option<String>,
    },
}

/// `RUST_LOG` wins when set and valid; otherwise the verbosity flag decides.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose, rust_log.as_deref()))
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Prepare {
            input_csv,
            output_dir,
            seed,
        } => {
            let config = PrepareConfig::new(input_csv, output_dir).with_seed(seed);
            let prepared = churn_pipeline::prepare_dataset(config)
                .await
                .context("Preprocessing failed")?;

            for kind in PartitionKind::ALL {
                info!(
                    "  {}: {} rows -> {}",
                    kind,
                    prepared.rows(kind),
                    prepared.paths.get(kind).display()
                );
            }
            info!("Target mapping: {:?}", prepared.target_encoding.classes());
        }
        Commands::Upload {
            processed_dir,
            store_root,
            bucket,
        } => {
            let bucket = resolve_bucket(bucket, env_lookup)?;
            let store = FsObjectStore::new(store_root);
            for kind in [PartitionKind::Train, PartitionKind::Validation] {
                let path = processed_dir.join(kind.file_name());
                store
                    .upload(&path, kind.name(), &bucket)
                    .await
                    .with_context(|| format!("Failed to upload {}", path.display()))?;
            }
        }
        Commands::SmokeTest {
            endpoint_name,
            base_url,
            test_csv,
            limit,
        } => {
            let client = HttpPredictionClient::new(base_url)?;
            let endpoint = Endpoint::new(endpoint_name);
            let predictions = smoke_test(&client, &endpoint, &test_csv, limit).await?;
            for (idx, prediction) in predictions.iter().enumerate() {
                println!("{idx}: {prediction}");
            }
        }
        Commands::CheckConfig { bucket } => {
            let config = PipelineConfig::from_env(bucket)?;
            info!(
                bucket = %config.bucket,
                region = %config.region,
                role = %config.role_arn,
                "Platform configuration resolved"
            );
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_rust_log_overrides_verbosity() {
        assert_eq!(log_filter(false, Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter(true, Some("error")).max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_verbosity_applies_without_rust_log() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(true, Some("  ")).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_check_config_parses_bucket_override() {
        let cli = Cli::try_parse_from(["churn", "check-config", "--bucket", "churn-bucket"]).unwrap();
        match cli.command {
            Commands::CheckConfig { bucket } => assert_eq!(bucket.as_deref(), Some("churn-bucket")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
