use tokio_util::sync::CancellationToken;

use crate::chain::{BucketRecord, TxIntent};
use crate::context::StorageContext;
use crate::error::OperationError;
use crate::model::{Bucket, BucketId, ProviderId, TxHash, ValuePropId};
use crate::poll::{poll_until, Probe};
use crate::progress::{BucketStep, Progress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucket {
    pub name: String,
    pub msp_id: ProviderId,
    pub value_prop_id: ValuePropId,
    pub is_private: bool,
}

/// Create a bucket and wait until the index lists it.
///
/// `creating` submits the ledger write, `verifying` reads the record
///  back by its derived id and `waiting` polls the index.
pub async fn create_bucket(
    ctx: &StorageContext,
    req: CreateBucket,
    progress: &Progress<BucketStep>,
) -> Result<Bucket, OperationError> {
    progress
        .track(async {
            let owner = ctx.identity()?;

            progress.advance(BucketStep::Creating);
            let bucket_id = ctx.addressing().derive_bucket_id(&owner, &req.name);
            tracing::info!(name = %req.name, %bucket_id, "creating bucket");
            ctx.submitter()
                .submit(TxIntent::CreateBucket {
                    msp_id: req.msp_id,
                    name: req.name.clone(),
                    is_private: req.is_private,
                    value_prop_id: req.value_prop_id,
                })
                .await?;

            progress.advance(BucketStep::Verifying);
            verify_bucket(ctx, &bucket_id).await?;

            progress.advance(BucketStep::Waiting);
            let bucket = await_bucket_indexed(ctx, &bucket_id, &CancellationToken::new()).await?;

            progress.advance(BucketStep::Done);
            Ok::<_, OperationError>(bucket)
        })
        .await
}

/// Read a freshly created bucket straight from the ledger.
///
/// Only called after a successful receipt, so a missing record is a
///  ledger/client inconsistency rather than lag.
pub async fn verify_bucket(
    ctx: &StorageContext,
    bucket_id: &BucketId,
) -> Result<BucketRecord, OperationError> {
    match ctx.chain().read_bucket(bucket_id).await? {
        Some(record) => Ok(record),
        None => {
            tracing::error!(%bucket_id, "bucket missing on ledger after successful receipt");
            Err(OperationError::VerificationFailed(*bucket_id))
        }
    }
}

/// Poll the index until it lists `bucket_id`
pub async fn await_bucket_indexed(
    ctx: &StorageContext,
    bucket_id: &BucketId,
    cancel: &CancellationToken,
) -> Result<Bucket, OperationError> {
    poll_until(
        "bucket indexing",
        ctx.policies().index_visibility,
        cancel,
        move || async move {
            match ctx.backend().get_bucket(bucket_id).await {
                Ok(bucket) => Ok(Probe::Satisfied(bucket)),
                Err(e) if e.is_not_found() => Ok(Probe::NotYetVisible),
                Err(e) => Err(ctx.backend_error(e)),
            }
        },
    )
    .await
}

/// Delete an empty bucket.
///
/// The ledger refuses to delete a bucket that still holds files; that
///  surfaces as [`OperationError::ExecutionReverted`]. The index is
///  not consulted, it catches up on its own.
pub async fn delete_bucket(
    ctx: &StorageContext,
    bucket_id: &BucketId,
) -> Result<TxHash, OperationError> {
    ctx.identity()?;
    tracing::info!(%bucket_id, "deleting bucket");

    let receipt = ctx
        .submitter()
        .submit(TxIntent::DeleteBucket {
            bucket_id: *bucket_id,
        })
        .await
        .map_err(|e| match e {
            OperationError::ExecutionReverted { tx_hash, .. } => {
                OperationError::ExecutionReverted {
                    tx_hash,
                    message: format!(
                        "bucket {} could not be deleted, it must hold no files",
                        bucket_id
                    ),
                }
            }
            other => other,
        })?;

    ctx.listings().forget_bucket(bucket_id);
    Ok(receipt.transaction_hash)
}

pub async fn list_buckets(ctx: &StorageContext) -> Result<Vec<Bucket>, OperationError> {
    ctx.backend()
        .list_buckets()
        .await
        .map_err(|e| ctx.backend_error(e))
}

pub async fn get_bucket(ctx: &StorageContext, bucket_id: &BucketId) -> Result<Bucket, OperationError> {
    ctx.backend()
        .get_bucket(bucket_id)
        .await
        .map_err(|e| ctx.backend_error(e))
}
