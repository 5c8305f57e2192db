use clap::Args;

use common::error::{FailureReason, OperationError};
use common::model::{BucketId, FileKey};
use common::ops;

use crate::cli::op::{ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Info {
    #[arg(long)]
    pub bucket_id: BucketId,

    #[arg(long)]
    pub file_key: FileKey,
}

#[derive(Debug, thiserror::Error)]
pub enum FileInfoError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Info {
    type Error = FileInfoError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let info = ops::get_file_info(&conn.storage, &self.bucket_id, &self.file_key).await?;

        let mut lines = vec![
            format!("file key:    {}", info.file_key),
            format!("location:    {}", info.location),
            format!("owner:       {}", info.owner),
            format!("fingerprint: {}", info.fingerprint),
            format!("size:        {}", info.size_bytes),
            format!("status:      {}", info.status),
        ];
        if info.status.is_terminal_failure() {
            if let Some(reason) = FailureReason::from_status(info.status) {
                lines.push(format!("reason:      {}", reason));
            }
        }
        Ok(lines.join("\n"))
    }
}
