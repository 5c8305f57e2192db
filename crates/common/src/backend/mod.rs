//! Interfaces to the off-chain side: the indexing backend, its
//!  SIWE-style auth endpoints and the storage provider's transfer
//!  endpoints.
//!
//! Implementations that talk to an authenticated endpoint are
//!  expected to ask their [`SessionProvider`] for credentials right
//!  before each request, never once up front.

mod error;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::model::{
    Address, Bucket, BucketId, FileInfo, FileKey, FileTree, MspInfo, ValueProposition,
};

pub use error::BackendError;

/// What a transport attaches to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub identity: Address,
}

pub trait SessionProvider: Send + Sync {
    /// Credentials to attach to the request about to be dispatched,
    ///  or `None` if there is no active session
    fn credentials(&self) -> Option<Credentials>;
}

#[async_trait]
pub trait BackendApi: Send + Sync + fmt::Debug {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError>;

    async fn get_bucket(&self, bucket_id: &BucketId) -> Result<Bucket, BackendError>;

    async fn get_files(&self, bucket_id: &BucketId) -> Result<FileTree, BackendError>;

    /// Fails with [`BackendError::NotFound`] while the file is not
    ///  indexed yet and once it has been deleted
    async fn get_file_info(
        &self,
        bucket_id: &BucketId,
        file_key: &FileKey,
    ) -> Result<FileInfo, BackendError>;

    async fn msp_info(&self) -> Result<MspInfo, BackendError>;

    async fn value_propositions(&self) -> Result<Vec<ValueProposition>, BackendError>;

    async fn health(&self) -> Result<String, BackendError>;
}

/// Signable login challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub message: String,
}

/// A challenge message together with the wallet's signature over it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedChallenge {
    pub message: String,
    pub signature: String,
}

/// What the backend hands back for a verified signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub address: Address,
}

#[async_trait]
pub trait AuthApi: Send + Sync + fmt::Debug {
    /// Request a challenge for `address`, scoped to `domain` + `uri`
    async fn nonce(
        &self,
        address: &Address,
        chain_id: u64,
        domain: &str,
        uri: &str,
    ) -> Result<Challenge, BackendError>;

    async fn verify(&self, signed: &SignedChallenge) -> Result<SessionGrant, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP-style status reported by the provider
    pub status: u16,
    pub message: Option<String>,
}

impl UploadReceipt {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type ByteStream = BoxStream<'static, Result<Bytes, BackendError>>;

pub struct Download {
    pub status: u16,
    pub content_type: Option<String>,
    pub stream: ByteStream,
}

impl Download {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait TransferApi: Send + Sync + fmt::Debug {
    /// Push the bytes of an already-issued storage request
    async fn upload_bytes(
        &self,
        bucket_id: &BucketId,
        file_key: &FileKey,
        bytes: Bytes,
        owner: &Address,
        name: &str,
    ) -> Result<UploadReceipt, BackendError>;

    async fn download_bytes(&self, file_key: &FileKey) -> Result<Download, BackendError>;
}
