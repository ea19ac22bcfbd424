//! Platform configuration
//!
//! Values come from the environment (or any lookup function in tests) and are
//! then passed around explicitly; nothing below reads the environment again.

use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{PipelineError, Result};

pub const BUCKET_VAR: &str = "S3_BUCKET";
pub const ROLE_VAR: &str = "AWS_ROLE_ARN";
pub const REGION_VAR: &str = "AWS_REGION";
pub const REGION_FALLBACK_VAR: &str = "AWS_DEFAULT_REGION";

/// Settings shared by the upload, training and deployment stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub bucket: String,
    pub role_arn: String,
    pub region: String,
}

impl PipelineConfig {
    /// Load from process environment variables; a non-blank
    /// `bucket_override` replaces `S3_BUCKET`.
    pub fn from_env(bucket_override: Option<String>) -> Result<Self> {
        Self::resolve(bucket_override, env_lookup)
    }

    /// Load using `lookup` for each variable; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(None, lookup)
    }

    fn resolve<F>(bucket_override: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = resolve_bucket(bucket_override, &lookup)?;
        let role_arn = require(&lookup, ROLE_VAR)?;
        let region = non_blank(lookup(REGION_VAR))
            .or_else(|| non_blank(lookup(REGION_FALLBACK_VAR)))
            .ok_or_else(|| PipelineError::missing(REGION_VAR))?;

        Ok(Self {
            bucket,
            role_arn,
            region,
        })
    }
}

/// Resolve only the destination bucket: explicit override first, then env.
pub fn resolve_bucket<F>(override_bucket: Option<String>, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(override_bucket).map_or_else(|| require(&lookup, BUCKET_VAR), Ok)
}

pub fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup(key)).ok_or_else(|| {
        tracing::error!(variable = key, "Required configuration value is not set");
        PipelineError::missing(key)
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
