use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::deletion::{track_deletion, DeletionHandle};
use crate::backend::Download;
use crate::chain::{StorageRequestRecord, TxIntent};
use crate::context::StorageContext;
use crate::error::{FailureReason, OperationError};
use crate::model::{
    BucketId, FileEntry, FileInfo, FileKey, FileStatus, Fingerprint, ProviderId, TxHash,
};
use crate::poll::{poll_until, Probe};
use crate::progress::{DeleteStep, Progress, UploadStep};

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bucket_id: BucketId,
    /// Location of the file inside the bucket
    pub name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_key: FileKey,
    pub fingerprint: Fingerprint,
    pub size_bytes: u64,
    pub tx_hash: TxHash,
    pub info: FileInfo,
}

/// Upload a file end to end.
///
/// `preparing` fingerprints the bytes, `issuing` submits the storage
///  request, `confirming` waits for the provider's countersignature on
///  the ledger and `finalizing` pushes the bytes and waits for the
///  index to report the file ready.
pub async fn upload_file(
    ctx: &StorageContext,
    req: UploadFile,
    progress: &Progress<UploadStep>,
) -> Result<UploadedFile, OperationError> {
    progress
        .track(async {
            let owner = ctx.identity()?;

            progress.advance(UploadStep::Preparing);
            let fingerprint = ctx.addressing().fingerprint(&req.bytes);
            let size_bytes = req.bytes.len() as u64;
            tracing::info!(name = %req.name, %fingerprint, size_bytes, "prepared file");

            progress.advance(UploadStep::Issuing);
            let msp = ctx
                .backend()
                .msp_info()
                .await
                .map_err(|e| ctx.backend_error(e))?;
            let peer_ids = msp.peer_ids();
            if peer_ids.is_empty() {
                return Err(OperationError::DefinitivelyFailed(
                    FailureReason::NoProviderPeers,
                ));
            }
            let receipt = ctx
                .submitter()
                .submit(TxIntent::IssueStorageRequest {
                    bucket_id: req.bucket_id,
                    location: req.name.clone(),
                    fingerprint,
                    size_bytes,
                    msp_id: msp.msp_id,
                    peer_ids,
                })
                .await?;
            let file_key = ctx
                .addressing()
                .derive_file_key(&owner, &req.bucket_id, &req.name);
            tracing::info!(%file_key, tx_hash = %receipt.transaction_hash, "storage request issued");

            let cancel = CancellationToken::new();

            progress.advance(UploadStep::Confirming);
            await_storage_confirmation(ctx, &file_key, &msp.msp_id, &cancel).await?;

            progress.advance(UploadStep::Finalizing);
            let upload = ctx
                .transfer()
                .upload_bytes(&req.bucket_id, &file_key, req.bytes.clone(), &owner, &req.name)
                .await
                .map_err(|e| ctx.backend_error(e))?;
            if !upload.is_success() {
                return Err(OperationError::TransferFailed {
                    status: upload.status,
                    message: upload
                        .message
                        .unwrap_or_else(|| "upload rejected by provider".to_string()),
                });
            }
            let info = await_file_ready(ctx, &req.bucket_id, &file_key, &cancel).await?;

            progress.advance(UploadStep::Done);
            Ok::<_, OperationError>(UploadedFile {
                file_key,
                fingerprint,
                size_bytes,
                tx_hash: receipt.transaction_hash,
                info,
            })
        })
        .await
}

/// Poll the ledger until `msp_id` has countersigned the storage
///  request for `file_key`
pub async fn await_storage_confirmation(
    ctx: &StorageContext,
    file_key: &FileKey,
    msp_id: &ProviderId,
    cancel: &CancellationToken,
) -> Result<StorageRequestRecord, OperationError> {
    poll_until(
        "storage request confirmation",
        ctx.policies().confirmation,
        cancel,
        move || async move {
            match ctx.chain().read_storage_request(file_key).await {
                Ok(Some(record)) if record.is_confirmed_by(msp_id) => {
                    Ok(Probe::Satisfied(record))
                }
                Ok(Some(_)) => Ok(Probe::NotYetVisible),
                // the request was included, so it cannot be missing here
                Ok(None) => Ok(Probe::Failed(FailureReason::RecordVanished)),
                Err(e) => Err(OperationError::from(e)),
            }
        },
    )
    .await
}

/// Poll the index until the file leaves `pending`
pub async fn await_file_ready(
    ctx: &StorageContext,
    bucket_id: &BucketId,
    file_key: &FileKey,
    cancel: &CancellationToken,
) -> Result<FileInfo, OperationError> {
    poll_until(
        "file readiness",
        ctx.policies().readiness,
        cancel,
        move || async move {
            let info = match ctx.backend().get_file_info(bucket_id, file_key).await {
                Ok(info) => info,
                Err(e) if e.is_not_found() => return Ok(Probe::NotYetVisible),
                Err(e) => return Err(ctx.backend_error(e)),
            };
            Ok(match info.status {
                FileStatus::Pending => Probe::NotYetVisible,
                FileStatus::Ready => Probe::Satisfied(info),
                status if !FileStatus::Pending.can_transition_to(status) => {
                    Probe::Failed(FailureReason::UnexpectedStatus(status))
                }
                status => Probe::Failed(
                    FailureReason::from_status(status)
                        .unwrap_or(FailureReason::UnexpectedStatus(status)),
                ),
            })
        },
    )
    .await
}

/// Request deletion of a file and start tracking its removal.
///
/// The request is built from the file's current metadata, so it is
///  read first. Once the ledger accepts it the cached listing shows the
///  file as `deletionInProgress` and the returned handle follows the
///  index in the background.
pub async fn delete_file(
    ctx: &StorageContext,
    bucket_id: &BucketId,
    file_key: &FileKey,
    progress: Progress<DeleteStep>,
) -> Result<DeletionHandle, OperationError> {
    let receipt = progress
        .track(async {
            ctx.identity()?;

            progress.advance(DeleteStep::Requesting);
            let info = ctx
                .backend()
                .get_file_info(bucket_id, file_key)
                .await
                .map_err(|e| ctx.backend_error(e))?;

            ctx.submitter()
                .submit(TxIntent::RequestDeleteFile {
                    bucket_id: *bucket_id,
                    file_key: *file_key,
                    location: info.location,
                    size_bytes: info.size_bytes,
                    fingerprint: info.fingerprint,
                })
                .await
        })
        .await?;
    tracing::info!(%file_key, tx_hash = %receipt.transaction_hash, "deletion requested");

    ctx.listings()
        .set_status(file_key, FileStatus::DeletionInProgress);
    progress.advance(DeleteStep::DeletionInProgress);

    Ok(track_deletion(ctx, *bucket_id, *file_key, progress))
}

/// Fetch the bytes of a ready file. Not retried: a failed transfer
///  is returned to the caller.
pub async fn download_file(ctx: &StorageContext, file_key: &FileKey) -> Result<Download, OperationError> {
    let download = ctx
        .transfer()
        .download_bytes(file_key)
        .await
        .map_err(|e| ctx.backend_error(e))?;

    if !download.is_success() {
        return Err(OperationError::TransferFailed {
            status: download.status,
            message: format!("download of {} failed", file_key),
        });
    }
    Ok(download)
}

pub async fn get_file_info(
    ctx: &StorageContext,
    bucket_id: &BucketId,
    file_key: &FileKey,
) -> Result<FileInfo, OperationError> {
    ctx.backend()
        .get_file_info(bucket_id, file_key)
        .await
        .map_err(|e| ctx.backend_error(e))
}

/// Flattened listing of a bucket. Files with a deletion still being
///  tracked show as `deletionInProgress` even if the index lags.
pub async fn list_files(
    ctx: &StorageContext,
    bucket_id: &BucketId,
) -> Result<Vec<FileEntry>, OperationError> {
    let tree = ctx
        .backend()
        .get_files(bucket_id)
        .await
        .map_err(|e| ctx.backend_error(e))?;

    let mut entries = tree.flatten();
    for entry in entries.iter_mut() {
        if entry.status == FileStatus::Ready && ctx.deletions().is_tracking(&entry.file_key) {
            entry.status = FileStatus::DeletionInProgress;
        }
    }

    ctx.listings().set(*bucket_id, entries.clone());
    Ok(entries)
}
