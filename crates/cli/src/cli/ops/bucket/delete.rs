use clap::Args;

use common::error::OperationError;
use common::model::BucketId;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

/// Delete an empty bucket
#[derive(Args, Debug, Clone)]
pub struct Delete {
    #[arg(long)]
    pub bucket_id: BucketId,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketDeleteError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Delete {
    type Error = BucketDeleteError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let tx_hash = ops::delete_bucket(&conn.storage, &self.bucket_id).await?;
        Ok(format!("Deleted bucket {} in {}", self.bucket_id, tx_hash))
    }
}
