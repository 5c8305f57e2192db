use std::path::PathBuf;

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use common::backend::BackendError;
use common::error::OperationError;
use common::model::FileKey;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Download {
    #[arg(long)]
    pub file_key: FileKey,

    /// Where to write the bytes
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum FileDownloadError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("download interrupted: {0}")]
    Stream(#[from] BackendError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Download {
    type Error = FileDownloadError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let mut download = ops::download_file(&conn.storage, &self.file_key).await?;

        let write_err = |e| FileDownloadError::Write(self.out.clone(), e);
        let mut out = tokio::fs::File::create(&self.out).await.map_err(write_err)?;
        let mut written = 0u64;
        while let Some(chunk) = download.stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        out.flush().await.map_err(write_err)?;

        tracing::debug!(file_key = %self.file_key, written, "download complete");
        Ok(format!("Wrote {} bytes to {}", written, self.out.display()))
    }
}
