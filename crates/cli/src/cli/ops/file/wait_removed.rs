use clap::Args;

use common::error::OperationError;
use common::model::{BucketId, FileKey};
use common::ops::{self, DeletionOutcome};
use common::progress::{DeleteStep, Progress};

use crate::cli::op::{print_progress, ContextError, OpContext};

/// Follow a deletion requested earlier until the index drops the file
#[derive(Args, Debug, Clone)]
pub struct WaitRemoved {
    #[arg(long)]
    pub bucket_id: BucketId,

    #[arg(long)]
    pub file_key: FileKey,
}

#[derive(Debug, thiserror::Error)]
pub enum WaitRemovedError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for WaitRemoved {
    type Error = WaitRemovedError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let (progress, rx) = Progress::channel("file removal", DeleteStep::DeletionInProgress);
        let printer = print_progress("file removal", rx);

        let outcome = ops::track_deletion(&conn.storage, self.bucket_id, self.file_key, progress)
            .wait()
            .await;
        let _ = printer.await;

        Ok(match outcome? {
            DeletionOutcome::Removed => format!("{} is gone", self.file_key),
            DeletionOutcome::Halted(status) => {
                format!("{} is no longer being deleted, status {}", self.file_key, status)
            }
        })
    }
}
