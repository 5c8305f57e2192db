use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::ALICE;
use crate::addressing::{Blake3Addressing, ContentAddressing};
use crate::chain::{
    BucketRecord, ChainClient, ChainError, FeeParams, MspAcceptance, Receipt, ReceiptStatus,
    StorageRequestRecord, TxIntent,
};
use crate::model::{Address, BucketId, FileKey, TxHash};

#[derive(Debug)]
struct ChainState {
    sender: Address,
    base_fee: u128,
    block: u64,
    submissions: Vec<(TxIntent, FeeParams)>,
    included: HashMap<TxHash, ReceiptStatus>,
    receipt_waits: usize,
    storage_request_reads: usize,
    reject_next: Option<String>,
    revert_next: bool,
    drop_bucket_records: bool,
    drop_storage_requests: bool,
    confirmation_lag: u32,
    buckets: HashMap<BucketId, BucketRecord>,
    storage_requests: HashMap<FileKey, StorageRequestRecord>,
    unconfirmed_reads_left: HashMap<FileKey, u32>,
}

impl ChainState {
    fn apply(&mut self, intent: &TxIntent) {
        let addressing = Blake3Addressing;
        match intent {
            TxIntent::CreateBucket {
                msp_id,
                name,
                is_private,
                value_prop_id,
            } => {
                if self.drop_bucket_records {
                    return;
                }
                let id = addressing.derive_bucket_id(&self.sender, name);
                self.buckets.insert(
                    id,
                    BucketRecord {
                        owner: self.sender,
                        msp_id: Some(*msp_id),
                        private: *is_private,
                        value_prop_id: Some(*value_prop_id),
                        size_bytes: 0,
                    },
                );
            }
            TxIntent::DeleteBucket { bucket_id } => {
                self.buckets.remove(bucket_id);
            }
            TxIntent::IssueStorageRequest {
                bucket_id,
                location,
                fingerprint,
                size_bytes,
                msp_id,
                ..
            } => {
                let key = addressing.derive_file_key(&self.sender, bucket_id, location);
                self.storage_requests.insert(
                    key,
                    StorageRequestRecord {
                        bucket_id: *bucket_id,
                        location: location.clone(),
                        fingerprint: *fingerprint,
                        size_bytes: *size_bytes,
                        msp: Some(MspAcceptance {
                            msp_id: *msp_id,
                            confirmed: false,
                        }),
                    },
                );
                self.unconfirmed_reads_left
                    .insert(key, self.confirmation_lag);
            }
            TxIntent::RequestDeleteFile { file_key, .. } => {
                self.storage_requests.remove(file_key);
            }
        }
    }
}

/// In-memory ledger.
///
/// Transactions are included as soon as they are submitted. Storage
///  requests stay unconfirmed for a configurable number of reads
///  before the assigned provider countersigns them.
#[derive(Debug, Clone)]
pub struct MockChain {
    inner: Arc<Mutex<ChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_sender(ALICE)
    }

    /// Ledger whose transactions are all signed by `sender`
    pub fn with_sender(sender: Address) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChainState {
                sender,
                base_fee: 1_000_000_000,
                block: 0,
                submissions: Vec::new(),
                included: HashMap::new(),
                receipt_waits: 0,
                storage_request_reads: 0,
                reject_next: None,
                revert_next: false,
                drop_bucket_records: false,
                drop_storage_requests: false,
                confirmation_lag: 0,
                buckets: HashMap::new(),
                storage_requests: HashMap::new(),
                unconfirmed_reads_left: HashMap::new(),
            })),
        }
    }

    pub fn set_base_fee(&self, base_fee: u128) {
        self.inner.lock().base_fee = base_fee;
    }

    /// The node refuses the next submission with `reason`
    pub fn reject_next_submission(&self, reason: &str) {
        self.inner.lock().reject_next = Some(reason.to_string());
    }

    /// The next submission is included but reverts, with no effect
    pub fn revert_next_receipt(&self) {
        self.inner.lock().revert_next = true;
    }

    /// Bucket creations succeed without leaving a record behind
    pub fn drop_bucket_records(&self) {
        self.inner.lock().drop_bucket_records = true;
    }

    /// Storage requests vanish from the ledger once included
    pub fn drop_storage_requests(&self) {
        self.inner.lock().drop_storage_requests = true;
    }

    /// Storage requests read as unconfirmed `reads` times first
    pub fn confirm_after(&self, reads: u32) {
        self.inner.lock().confirmation_lag = reads;
    }

    /// Storage requests are never countersigned
    pub fn never_confirm(&self) {
        self.inner.lock().confirmation_lag = u32::MAX;
    }

    pub fn submissions(&self) -> Vec<(TxIntent, FeeParams)> {
        self.inner.lock().submissions.clone()
    }

    pub fn receipt_waits(&self) -> usize {
        self.inner.lock().receipt_waits
    }

    pub fn storage_request_reads(&self) -> usize {
        self.inner.lock().storage_request_reads
    }

    pub fn bucket(&self, bucket_id: &BucketId) -> Option<BucketRecord> {
        self.inner.lock().buckets.get(bucket_id).cloned()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn current_base_fee(&self) -> Result<u128, ChainError> {
        Ok(self.inner.lock().base_fee)
    }

    async fn submit_transaction(
        &self,
        intent: &TxIntent,
        fees: &FeeParams,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.inner.lock();
        if let Some(reason) = state.reject_next.take() {
            return Err(ChainError::Rejected(reason));
        }

        state.submissions.push((intent.clone(), *fees));
        let nonce = state.submissions.len() as u64;
        let tx_hash = TxHash::from_bytes(*blake3::hash(&nonce.to_le_bytes()).as_bytes());

        let status = if std::mem::take(&mut state.revert_next) {
            ReceiptStatus::Reverted
        } else {
            state.apply(intent);
            ReceiptStatus::Success
        };
        state.included.insert(tx_hash, status);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        let mut state = self.inner.lock();
        state.receipt_waits += 1;
        let status = state
            .included
            .remove(tx_hash)
            .ok_or_else(|| ChainError::Transport(format!("unknown transaction {}", tx_hash)))?;
        state.block += 1;
        Ok(Receipt {
            status,
            transaction_hash: *tx_hash,
            block_number: Some(state.block),
        })
    }

    async fn read_bucket(&self, bucket_id: &BucketId) -> Result<Option<BucketRecord>, ChainError> {
        Ok(self.inner.lock().buckets.get(bucket_id).cloned())
    }

    async fn read_storage_request(
        &self,
        file_key: &FileKey,
    ) -> Result<Option<StorageRequestRecord>, ChainError> {
        let mut state = self.inner.lock();
        state.storage_request_reads += 1;
        if state.drop_storage_requests {
            return Ok(None);
        }

        let confirm = match state.unconfirmed_reads_left.get_mut(file_key) {
            Some(left) if *left > 0 => {
                *left -= 1;
                false
            }
            _ => true,
        };
        let Some(record) = state.storage_requests.get_mut(file_key) else {
            return Ok(None);
        };
        if confirm {
            if let Some(msp) = record.msp.as_mut() {
                msp.confirmed = true;
            }
        }
        Ok(Some(record.clone()))
    }
}
