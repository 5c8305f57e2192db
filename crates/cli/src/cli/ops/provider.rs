use clap::Args;

use common::error::OperationError;
use common::ops;

use crate::cli::op::{ContextError, OpContext};

/// Show the storage provider and the offers a new bucket can take
#[derive(Args, Debug, Clone)]
pub struct Provider;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Provider {
    type Error = ProviderError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let msp = ops::msp_info(&conn.storage).await?;
        let offers = ops::available_value_propositions(&conn.storage).await?;

        let mut lines = vec![format!("msp: {}", msp.msp_id)];
        for peer in msp.peer_ids() {
            lines.push(format!("  peer {}", peer));
        }
        if offers.is_empty() {
            lines.push("no available offers".to_string());
        }
        for offer in offers {
            lines.push(format!(
                "offer {} price/GU/tick={} limit={}",
                offer.id, offer.price_per_giga_unit_per_tick, offer.data_limit
            ));
        }
        Ok(lines.join("\n"))
    }
}
