//! Filesystem-backed object store
//!
//! Lays buckets out as directories under a root, e.g.
//! `<root>/<bucket>/churn-data/train.csv`. Useful for local runs and for
//! buckets mounted into the filesystem.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

use crate::errors::{Collaborator, PipelineError, Result};
use crate::platform::{ObjectLocation, ObjectStore};

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path backing `location`.
    pub fn object_path(&self, location: &ObjectLocation) -> PathBuf {
        self.root.join(&location.bucket).join(&location.key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(
        &self,
        local_path: &Path,
        logical_name: &str,
        bucket: &str,
    ) -> Result<ObjectLocation> {
        let location = ObjectLocation::for_dataset(bucket, logical_name);
        let destination = self.object_path(&location);

        copy_atomically(local_path, &destination).await.map_err(|err| {
            error!(
                file = %local_path.display(),
                destination = %location,
                error = %err,
                "Failed to upload partition"
            );
            PipelineError::upstream(
                Collaborator::ObjectStore,
                format!("upload of {} to {location} failed: {err}", local_path.display()),
            )
        })?;

        info!(name = logical_name, destination = %location, "Uploaded partition");
        Ok(location)
    }
}

async fn copy_atomically(source: &Path, destination: &Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }
    let staging = destination.with_extension("partial");
    if let Err(err) = fs::copy(source, &staging).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err);
    }
    if let Err(err) = fs::rename(&staging, destination).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_uses_dataset_key() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let local = dir.path().join("train.csv");
        std::fs::write(&local, "0,1,29.85\n")?;

        let store = FsObjectStore::new(dir.path().join("buckets"));
        let location = store.upload(&local, "train", "churn-bucket").await?;

        assert_eq!(location.uri(), "s3://churn-bucket/churn-data/train.csv");
        let stored = dir.path().join("buckets/churn-bucket/churn-data/train.csv");
        assert_eq!(std::fs::read_to_string(stored)?, "0,1,29.85\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_overwrites_previous_object() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let local = dir.path().join("validation.csv");
        let store = FsObjectStore::new(dir.path());

        std::fs::write(&local, "old\n")?;
        store.upload(&local, "validation", "b").await?;
        std::fs::write(&local, "new\n")?;
        let location = store.upload(&local, "validation", "b").await?;

        assert_eq!(std::fs::read_to_string(store.object_path(&location))?, "new\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_is_upstream_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FsObjectStore::new(dir.path());

        let err = store
            .upload(&dir.path().join("absent.csv"), "train", "b")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Upstream {
                collaborator: Collaborator::ObjectStore,
                ..
            }
        ));
        assert!(!dir.path().join("b/churn-data/train.partial").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_failure_removes_staging_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let local = dir.path().join("train.csv");
        std::fs::write(&local, "0,1,29.85\n")?;
        let store = FsObjectStore::new(dir.path());
        let occupied = dir.path().join("b/churn-data/train.csv");
        std::fs::create_dir_all(&occupied)?;
        std::fs::write(occupied.join("object"), "x")?;

        let err = store.upload(&local, "train", "b").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Upstream {
                collaborator: Collaborator::ObjectStore,
                ..
            }
        ));
        assert!(!dir.path().join("b/churn-data/train.partial").exists());
        Ok(())
    }
}
