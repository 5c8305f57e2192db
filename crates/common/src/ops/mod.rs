//! Orchestrated operations.
//!
//! Every function here resolves to a typed value or a classified
//!  [`OperationError`](crate::error::OperationError). None of them
//!  talk to a transport directly; they go through the submitter, the
//!  poller and the collaborators held by the context.

pub mod bucket;
pub mod deletion;
pub mod file;
pub mod provider;

pub use bucket::{
    await_bucket_indexed, create_bucket, delete_bucket, get_bucket, list_buckets, verify_bucket,
    CreateBucket,
};
pub use deletion::{await_file_removed, track_deletion, DeletionHandle, DeletionOutcome, DeletionTracker};
pub use file::{
    await_file_ready, await_storage_confirmation, delete_file, download_file, get_file_info,
    list_files, upload_file, UploadFile, UploadedFile,
};
pub use provider::{available_value_propositions, msp_info};
