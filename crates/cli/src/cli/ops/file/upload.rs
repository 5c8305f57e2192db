use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::Args;

use common::error::OperationError;
use common::model::BucketId;
use common::ops::{self, UploadFile};
use common::progress::{Progress, UploadStep};

use crate::cli::op::{print_progress, ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    #[arg(long)]
    pub bucket_id: BucketId,

    /// Local file to upload
    #[arg(long)]
    pub path: PathBuf,

    /// Location inside the bucket (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FileUploadError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("cannot derive a bucket location from {0}, pass --name")]
    NoName(PathBuf),
}

/// Bucket location for `path` when `--name` is not given
fn location_for(path: &Path, name: Option<&str>) -> Option<String> {
    match name {
        Some(name) => Some(name.trim_start_matches('/').to_string()),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string),
    }
    .filter(|location| !location.is_empty())
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = FileUploadError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let name = location_for(&self.path, self.name.as_deref())
            .ok_or_else(|| FileUploadError::NoName(self.path.clone()))?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FileUploadError::Read(self.path.clone(), e))?;

        let conn = ctx.connect()?;
        let (progress, rx) = Progress::channel("upload", UploadStep::Preparing);
        let printer = print_progress("upload", rx);
        let result = ops::upload_file(
            &conn.storage,
            UploadFile {
                bucket_id: self.bucket_id,
                name,
                bytes: Bytes::from(bytes),
            },
            &progress,
        )
        .await;
        drop(progress);
        let _ = printer.await;

        let uploaded = result?;
        Ok([
            format!("file key:    {}", uploaded.file_key),
            format!("location:    {}", uploaded.info.location),
            format!("fingerprint: {}", uploaded.fingerprint),
            format!("size:        {}", uploaded.size_bytes),
            format!("status:      {}", uploaded.info.status),
            format!("tx:          {}", uploaded.tx_hash),
        ]
        .join("\n"))
    }
}
