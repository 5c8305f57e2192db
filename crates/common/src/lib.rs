/**
 * Fingerprints and deterministic bucket / file identifiers.
 */
pub mod addressing;
/**
 * Interfaces to the indexing backend, its auth endpoints
 *  and the storage provider's transfer endpoints.
 */
pub mod backend;
/**
 * Ledger side: chain client interface, transaction intents,
 *  receipts and the transaction submitter.
 */
pub mod chain;
pub mod context;
pub mod error;
/**
 * Buckets, files, providers and the identifiers that
 *  tie them together across ledger, index and provider.
 */
pub mod model;
/**
 * Orchestrated operations: bucket and file lifecycles.
 */
pub mod ops;
pub mod poll;
pub mod progress;
/**
 * Authenticated session lifecycle.
 */
pub mod session;
/**
 * In-memory ledger, backend and provider for tests.
 */
pub mod testkit;
/**
 * Helper for reporting build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::addressing::{Blake3Addressing, ContentAddressing};
    pub use crate::backend::{AuthApi, BackendApi, BackendError, SessionProvider, TransferApi};
    pub use crate::chain::{ChainClient, ChainError, FeePolicy, TxSubmitter};
    pub use crate::context::{Collaborators, StorageContext};
    pub use crate::error::{FailureReason, OperationError};
    pub use crate::model::{
        Address, Bucket, BucketId, FileEntry, FileInfo, FileKey, FileStatus, ProviderId, TxHash,
        ValuePropId,
    };
    pub use crate::poll::{PollPolicies, PollPolicy};
    pub use crate::progress::{BucketStep, DeleteStep, Progress, UploadStep};
    pub use crate::session::{Session, SessionConfig, SessionManager};
    pub use crate::version::build_info;
}
