use crate::context::StorageContext;
use crate::error::OperationError;
use crate::model::{MspInfo, ValueProposition};

pub async fn msp_info(ctx: &StorageContext) -> Result<MspInfo, OperationError> {
    ctx.backend()
        .msp_info()
        .await
        .map_err(|e| ctx.backend_error(e))
}

/// Offers currently open for new buckets
pub async fn available_value_propositions(
    ctx: &StorageContext,
) -> Result<Vec<ValueProposition>, OperationError> {
    let props = ctx
        .backend()
        .value_propositions()
        .await
        .map_err(|e| ctx.backend_error(e))?;
    Ok(props.into_iter().filter(|p| p.available).collect())
}
