use clap::Args;

use common::error::OperationError;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct List;

#[derive(Debug, thiserror::Error)]
pub enum BucketListError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = BucketListError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let buckets = ops::list_buckets(&conn.storage).await?;

        if buckets.is_empty() {
            return Ok("No buckets found".to_string());
        }
        Ok(buckets
            .iter()
            .map(super::describe)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
