use clap::Args;

use common::error::OperationError;
use common::model::BucketId;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

/// Show a bucket and the provider it lives on
#[derive(Args, Debug, Clone)]
pub struct Show {
    #[arg(long)]
    pub bucket_id: BucketId,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketShowError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = BucketShowError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let bucket = ops::get_bucket(&conn.storage, &self.bucket_id).await?;

        let mut lines = vec![
            format!("bucket:     {}", bucket.bucket_id),
            format!("name:       {}", bucket.name),
            format!("owner:      {}", bucket.owner),
            format!("private:    {}", bucket.is_private),
            format!("value prop: {}", bucket.value_prop_id),
            format!("files:      {}", bucket.file_count),
            format!("bytes:      {}", bucket.size_bytes),
        ];

        // the provider is informational, a failure here is not fatal
        match ops::msp_info(&conn.storage).await {
            Ok(msp) if msp.msp_id == bucket.msp_id => {
                lines.push(format!("msp:        {}", msp.msp_id));
                for addr in &msp.multiaddresses {
                    lines.push(format!("  {}", addr));
                }
            }
            Ok(_) => lines.push(format!("msp:        {}", bucket.msp_id)),
            Err(e) => {
                tracing::debug!(error = %e, "provider info unavailable");
                lines.push(format!("msp:        {}", bucket.msp_id));
            }
        }
        Ok(lines.join("\n"))
    }
}
