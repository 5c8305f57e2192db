use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::addressing::ContentAddressing;
use crate::backend::{BackendApi, BackendError, TransferApi};
use crate::chain::{ChainClient, FeePolicy, TxSubmitter};
use crate::error::OperationError;
use crate::model::{Address, BucketId, FileEntry, FileKey, FileStatus};
use crate::ops::DeletionTracker;
use crate::poll::PollPolicies;
use crate::session::SessionManager;

/// The external systems an orchestrator talks to
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainClient>,
    pub backend: Arc<dyn BackendApi>,
    pub transfer: Arc<dyn TransferApi>,
    pub addressing: Arc<dyn ContentAddressing>,
}

/// Everything an orchestrated operation needs, owned by the
///  application and passed by reference.
///
/// Cloning is cheap and clones share the session, the listing cache
///  and the set of tracked deletions.
#[derive(Debug, Clone)]
pub struct StorageContext {
    chain: Arc<dyn ChainClient>,
    backend: Arc<dyn BackendApi>,
    transfer: Arc<dyn TransferApi>,
    addressing: Arc<dyn ContentAddressing>,
    session: Arc<SessionManager>,
    submitter: TxSubmitter,
    policies: PollPolicies,
    wallet: Arc<RwLock<Option<Address>>>,
    listings: ListingCache,
    deletions: DeletionTracker,
}

impl StorageContext {
    pub fn new(
        collaborators: Collaborators,
        session: Arc<SessionManager>,
        fees: FeePolicy,
        policies: PollPolicies,
    ) -> Self {
        let Collaborators {
            chain,
            backend,
            transfer,
            addressing,
        } = collaborators;
        Self {
            submitter: TxSubmitter::new(chain.clone(), fees),
            chain,
            backend,
            transfer,
            addressing,
            session,
            policies,
            wallet: Arc::new(RwLock::new(None)),
            listings: ListingCache::default(),
            deletions: DeletionTracker::default(),
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    pub fn backend(&self) -> &Arc<dyn BackendApi> {
        &self.backend
    }

    pub fn transfer(&self) -> &Arc<dyn TransferApi> {
        &self.transfer
    }

    pub fn addressing(&self) -> &Arc<dyn ContentAddressing> {
        &self.addressing
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn submitter(&self) -> &TxSubmitter {
        &self.submitter
    }

    pub fn policies(&self) -> &PollPolicies {
        &self.policies
    }

    pub fn listings(&self) -> &ListingCache {
        &self.listings
    }

    pub fn deletions(&self) -> &DeletionTracker {
        &self.deletions
    }

    pub fn connect_wallet(&self, identity: Address) {
        *self.wallet.write() = Some(identity);
    }

    /// Forget the wallet, the session and any tracked deletions
    pub fn disconnect(&self) {
        self.wallet.write().take();
        self.session.invalidate();
        self.deletions.cancel_all();
    }

    /// The connected identity, required before any write
    pub fn identity(&self) -> Result<Address, OperationError> {
        (*self.wallet.read()).ok_or(OperationError::WalletOrIdentityMissing)
    }

    /// Classify a backend failure. Auth failures invalidate the
    ///  session and come back as [`OperationError::AuthExpired`]; the
    ///  caller must not retry them.
    pub fn backend_error(&self, err: BackendError) -> OperationError {
        if self.session.is_auth_error(&err) {
            tracing::warn!(error = %err, "backend rejected session");
            self.session.invalidate();
            return OperationError::AuthExpired;
        }
        match err {
            BackendError::Unavailable(msg) => OperationError::BackendUnavailable(msg),
            other => OperationError::Backend(other),
        }
    }
}

/// Locally cached bucket listings, with optimistic status overrides
#[derive(Debug, Clone, Default)]
pub struct ListingCache {
    inner: Arc<RwLock<HashMap<BucketId, Vec<FileEntry>>>>,
}

impl ListingCache {
    pub fn get(&self, bucket_id: &BucketId) -> Option<Vec<FileEntry>> {
        self.inner.read().get(bucket_id).cloned()
    }

    pub fn set(&self, bucket_id: BucketId, entries: Vec<FileEntry>) {
        self.inner.write().insert(bucket_id, entries);
    }

    pub fn set_status(&self, file_key: &FileKey, status: FileStatus) {
        let mut inner = self.inner.write();
        for entries in inner.values_mut() {
            for entry in entries.iter_mut().filter(|e| &e.file_key == file_key) {
                entry.status = status;
            }
        }
    }

    pub fn remove_file(&self, file_key: &FileKey) {
        let mut inner = self.inner.write();
        for entries in inner.values_mut() {
            entries.retain(|e| &e.file_key != file_key);
        }
    }

    pub fn forget_bucket(&self, bucket_id: &BucketId) {
        self.inner.write().remove(bucket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8) -> FileEntry {
        FileEntry {
            path: format!("f{}", byte),
            file_key: FileKey::from_bytes([byte; 32]),
            size_bytes: 1,
            status: FileStatus::Ready,
        }
    }

    #[test]
    fn test_listing_cache_overrides() {
        let cache = ListingCache::default();
        let bucket = BucketId::from_bytes([0; 32]);
        cache.set(bucket, vec![entry(1), entry(2)]);

        cache.set_status(&FileKey::from_bytes([1; 32]), FileStatus::DeletionInProgress);
        let entries = cache.get(&bucket).unwrap();
        assert_eq!(entries[0].status, FileStatus::DeletionInProgress);
        assert_eq!(entries[1].status, FileStatus::Ready);

        cache.remove_file(&FileKey::from_bytes([1; 32]));
        assert_eq!(cache.get(&bucket).unwrap().len(), 1);
    }
}
