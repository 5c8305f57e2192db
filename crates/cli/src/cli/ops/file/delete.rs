use clap::Args;

use common::error::OperationError;
use common::model::{BucketId, FileKey};
use common::ops::{self, DeletionOutcome};
use common::progress::{DeleteStep, Progress};

use crate::cli::op::{print_progress, ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Delete {
    #[arg(long)]
    pub bucket_id: BucketId,

    #[arg(long)]
    pub file_key: FileKey,

    /// Return once the ledger accepts the request instead of waiting
    ///  for the index to drop the file
    #[arg(long, default_value_t = false)]
    pub no_wait: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FileDeleteError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Delete {
    type Error = FileDeleteError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let (progress, rx) = Progress::channel("delete file", DeleteStep::Requesting);
        let printer = print_progress("delete file", rx);

        let handle =
            ops::delete_file(&conn.storage, &self.bucket_id, &self.file_key, progress).await;
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                let _ = printer.await;
                return Err(e.into());
            }
        };

        if self.no_wait {
            handle.cancel();
            printer.abort();
            return Ok(format!(
                "Deletion of {} requested; run `hub file wait-removed` to follow it",
                self.file_key
            ));
        }

        let outcome = handle.wait().await;
        let _ = printer.await;
        Ok(match outcome? {
            DeletionOutcome::Removed => format!("Removed {}", self.file_key),
            DeletionOutcome::Halted(status) => format!(
                "Deletion of {} halted, the file is now {}",
                self.file_key, status
            ),
        })
    }
}
