//! Archive writer
//!
//! Stages a snapshot in the scratch directory, uploads it under a per-camera,
//! per-day key and removes the staged copy once the upload is durable.

pub mod s3;

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use crate::error::Result;

pub use s3::S3ObjectStore;

pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";
pub const CAMERA_TAG: &str = "camera";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        tags: &[(String, String)],
    ) -> Result<()>;
}

/// `<name>_<YYYY-MM-DD-HH-mm-ss>.jpg`
pub fn file_name(display_name: &str, captured_at: &DateTime<Tz>) -> String {
    format!("{display_name}_{}.jpg", captured_at.format("%Y-%m-%d-%H-%M-%S"))
}

/// `<name>/Images/<YYYY-MM-DD>/<name>_<YYYY-MM-DD-HH-mm-ss>.jpg`
pub fn object_key(display_name: &str, captured_at: &DateTime<Tz>) -> String {
    format!(
        "{display_name}/Images/{}/{}",
        captured_at.format("%Y-%m-%d"),
        file_name(display_name, captured_at)
    )
}

#[derive(Debug, Clone)]
pub struct Archived {
    pub key: String,
    /// false when the staged file could not be deleted after upload
    pub staged_file_removed: bool,
}

pub struct ArchiveWriter {
    store: Arc<dyn ObjectStore>,
    scratch_dir: PathBuf,
}

impl ArchiveWriter {
    pub fn new(store: Arc<dyn ObjectStore>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn staging_path(&self, display_name: &str, captured_at: &DateTime<Tz>) -> PathBuf {
        // the object key keeps the name verbatim; the local file must stay flat
        let flat = file_name(display_name, captured_at).replace(['/', '\\'], "_");
        self.scratch_dir.join(flat)
    }

    /// Stage, upload, clean up.
    ///
    /// `Io` errors come from staging, anything else from the upload. A failed
    /// upload leaves the staged file in place.
    pub async fn archive(
        &self,
        data: &[u8],
        display_name: &str,
        captured_at: &DateTime<Tz>,
    ) -> Result<Archived> {
        let path = self.staging_path(display_name, captured_at);
        fs::write(&path, data).await?;
        tracing::info!(path = %path.display(), "Image saved to local file");

        let body = fs::read(&path).await?;
        let key = object_key(display_name, captured_at);
        let tags = vec![(CAMERA_TAG.to_string(), display_name.to_string())];

        self.store
            .put_object(&key, body, CONTENT_TYPE_JPEG, &tags)
            .await?;
        tracing::info!(bucket = %self.store.bucket(), key = %key, "Image uploaded");

        let staged_file_removed = remove_staged(&path).await;
        Ok(Archived {
            key,
            staged_file_removed,
        })
    }
}

async fn remove_staged(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Local file deleted");
            true
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to delete local file");
            false
        }
    }
}
