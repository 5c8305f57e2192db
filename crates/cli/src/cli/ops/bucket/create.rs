use clap::Args;

use common::error::OperationError;
use common::model::{ProviderId, ValuePropId};
use common::ops::{self, CreateBucket};
use common::progress::{BucketStep, Progress};

use crate::cli::op::{print_progress, ContextError, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Bucket name, unique per owner
    #[arg(long)]
    pub name: String,

    /// Storage provider (defaults to config, then the backend's provider)
    #[arg(long)]
    pub msp_id: Option<ProviderId>,

    /// Offer to subscribe to (defaults to config, then the first available one)
    #[arg(long)]
    pub value_prop_id: Option<ValuePropId>,

    #[arg(long, default_value_t = false)]
    pub private: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketCreateError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("the provider offers no available value propositions")]
    NoValueProposition,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = BucketCreateError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let config = &conn.state.config;

        let msp_id = match self.msp_id.or(config.msp_id) {
            Some(msp_id) => msp_id,
            None => ops::msp_info(&conn.storage).await?.msp_id,
        };
        let value_prop_id = match self.value_prop_id.or(config.value_prop_id) {
            Some(id) => id,
            None => ops::available_value_propositions(&conn.storage)
                .await?
                .first()
                .map(|offer| offer.id)
                .ok_or(BucketCreateError::NoValueProposition)?,
        };

        let (progress, rx) = Progress::channel("create bucket", BucketStep::Creating);
        let printer = print_progress("create bucket", rx);
        let result = ops::create_bucket(
            &conn.storage,
            CreateBucket {
                name: self.name.clone(),
                msp_id,
                value_prop_id,
                is_private: self.private,
            },
            &progress,
        )
        .await;
        drop(progress);
        let _ = printer.await;

        let bucket = result?;
        Ok(format!("Created bucket {}", super::describe(&bucket)))
    }
}
