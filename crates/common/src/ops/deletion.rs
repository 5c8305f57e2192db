//! Background tracking of file deletions.
//!
//! Deleting a file across the provider network is much slower than
//!  indexing an upload, so once the ledger accepts the request the
//!  caller gets a handle back and the convergence poll runs as its own
//!  task. At most one poll runs per file key: tracking a key again
//!  cancels the previous poll and starts over.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::StorageContext;
use crate::error::OperationError;
use crate::model::{BucketId, FileKey, FileStatus};
use crate::poll::{poll_until, Probe};
use crate::progress::{DeleteStep, Progress};

/// How a tracked deletion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The index no longer returns the file
    Removed,
    /// The index moved the file out of `deletionInProgress` without
    ///  removing it; the system rejected or reverted the deletion
    Halted(FileStatus),
}

#[derive(Debug)]
struct Tracked {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct TrackerInner {
    next_generation: u64,
    tracked: HashMap<FileKey, Tracked>,
}

/// Registry of in-flight deletion polls, keyed by file
#[derive(Debug, Clone, Default)]
pub struct DeletionTracker {
    inner: Arc<Mutex<TrackerInner>>,
}

impl DeletionTracker {
    /// Claim `file_key`, cancelling whatever poll held it before
    fn register(&self, file_key: FileKey) -> (CancellationToken, u64) {
        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let cancel = CancellationToken::new();
        if let Some(previous) = inner.tracked.insert(
            file_key,
            Tracked {
                generation,
                cancel: cancel.clone(),
            },
        ) {
            tracing::debug!(%file_key, "restarting deletion tracking");
            previous.cancel.cancel();
        }
        (cancel, generation)
    }

    fn finish(&self, file_key: &FileKey, generation: u64) {
        let mut inner = self.inner.lock();
        if inner
            .tracked
            .get(file_key)
            .map(|t| t.generation == generation)
            .unwrap_or(false)
        {
            inner.tracked.remove(file_key);
        }
    }

    pub fn is_tracking(&self, file_key: &FileKey) -> bool {
        self.inner.lock().tracked.contains_key(file_key)
    }

    /// Stop the poll for `file_key`, if any
    pub fn cancel(&self, file_key: &FileKey) {
        if let Some(tracked) = self.inner.lock().tracked.remove(file_key) {
            tracked.cancel.cancel();
        }
    }

    pub fn cancel_all(&self) {
        let mut inner = self.inner.lock();
        for (_, tracked) in inner.tracked.drain() {
            tracked.cancel.cancel();
        }
    }
}

/// Handle to a background deletion poll
#[derive(Debug)]
pub struct DeletionHandle {
    file_key: FileKey,
    cancel: CancellationToken,
    join: JoinHandle<Result<DeletionOutcome, OperationError>>,
}

impl DeletionHandle {
    pub fn file_key(&self) -> &FileKey {
        &self.file_key
    }

    /// Stop polling; requests already sent are left alone
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> Result<DeletionOutcome, OperationError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(file_key = %self.file_key, error = %e, "deletion task died");
                Err(OperationError::Cancelled {
                    operation: "deletion tracking".to_string(),
                })
            }
        }
    }
}

/// Poll the index until `file_key` is gone.
///
/// Idempotent: for a key that is already absent the first probe
///  reports [`DeletionOutcome::Removed`].
pub async fn await_file_removed(
    ctx: &StorageContext,
    bucket_id: &BucketId,
    file_key: &FileKey,
    cancel: &CancellationToken,
) -> Result<DeletionOutcome, OperationError> {
    poll_until(
        "file removal",
        ctx.policies().deletion,
        cancel,
        move || async move {
            match ctx.backend().get_file_info(bucket_id, file_key).await {
                Err(e) if e.is_not_found() => Ok(Probe::Satisfied(DeletionOutcome::Removed)),
                Err(e) => Err(ctx.backend_error(e)),
                Ok(info) => match info.status {
                    FileStatus::DeletionInProgress => Ok(Probe::NotYetVisible),
                    status @ (FileStatus::Pending
                    | FileStatus::Ready
                    | FileStatus::Rejected
                    | FileStatus::Revoked
                    | FileStatus::Expired) => {
                        Ok(Probe::Satisfied(DeletionOutcome::Halted(status)))
                    }
                },
            }
        },
    )
    .await
}

/// Spawn the background removal poll for `file_key`, replacing any
///  poll already tracking it
pub fn track_deletion(
    ctx: &StorageContext,
    bucket_id: BucketId,
    file_key: FileKey,
    progress: Progress<DeleteStep>,
) -> DeletionHandle {
    let (cancel, generation) = ctx.deletions().register(file_key);
    let task_ctx = ctx.clone();
    let task_cancel = cancel.clone();

    let join = tokio::spawn(async move {
        let result = await_file_removed(&task_ctx, &bucket_id, &file_key, &task_cancel).await;
        match &result {
            Ok(DeletionOutcome::Removed) => {
                tracing::info!(%file_key, "file removed");
                task_ctx.listings().remove_file(&file_key);
                progress.advance(DeleteStep::Removed);
            }
            Ok(DeletionOutcome::Halted(status)) => {
                tracing::warn!(%file_key, %status, "deletion halted");
                task_ctx.listings().set_status(&file_key, *status);
                progress.fail();
            }
            // a replacement poll or the caller owns the outcome now
            Err(OperationError::Cancelled { .. }) => {}
            Err(e) => {
                tracing::warn!(%file_key, error = %e, "deletion tracking failed");
                progress.fail();
            }
        }
        task_ctx.deletions().finish(&file_key, generation);
        result
    });

    DeletionHandle {
        file_key,
        cancel,
        join,
    }
}
