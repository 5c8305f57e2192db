use clap::Args;

use common::error::OperationError;
use common::model::BucketId;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    #[arg(long)]
    pub bucket_id: BucketId,
}

#[derive(Debug, thiserror::Error)]
pub enum FileLsError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = FileLsError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let entries = ops::list_files(&conn.storage, &self.bucket_id).await?;

        if entries.is_empty() {
            return Ok("No files found".to_string());
        }
        Ok(entries
            .iter()
            .map(|entry| {
                format!(
                    "{} ({} bytes) [{}] {}",
                    entry.path, entry.size_bytes, entry.status, entry.file_key
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
