//! Ledger side: the chain client interface, transaction intents,
//!  receipts and the records orchestrators read back.

mod submitter;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Address, BucketId, FileKey, Fingerprint, ProviderId, TxHash, ValuePropId};

pub use submitter::{FeePolicy, TxSubmitter};

/// A state-changing call to submit to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum TxIntent {
    #[serde(rename_all = "camelCase")]
    CreateBucket {
        msp_id: ProviderId,
        name: String,
        is_private: bool,
        value_prop_id: ValuePropId,
    },
    #[serde(rename_all = "camelCase")]
    DeleteBucket { bucket_id: BucketId },
    #[serde(rename_all = "camelCase")]
    IssueStorageRequest {
        bucket_id: BucketId,
        location: String,
        fingerprint: Fingerprint,
        size_bytes: u64,
        msp_id: ProviderId,
        peer_ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    RequestDeleteFile {
        bucket_id: BucketId,
        file_key: FileKey,
        location: String,
        size_bytes: u64,
        fingerprint: Fingerprint,
    },
}

impl TxIntent {
    pub fn name(&self) -> &'static str {
        match self {
            TxIntent::CreateBucket { .. } => "createBucket",
            TxIntent::DeleteBucket { .. } => "deleteBucket",
            TxIntent::IssueStorageRequest { .. } => "issueStorageRequest",
            TxIntent::RequestDeleteFile { .. } => "requestDeleteFile",
        }
    }
}

/// EIP-1559 style fee parameters, computed per submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeParams {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    pub owner: Address,
    pub msp_id: Option<ProviderId>,
    pub private: bool,
    pub value_prop_id: Option<ValuePropId>,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MspAcceptance {
    pub msp_id: ProviderId,
    pub confirmed: bool,
}

/// Ledger-side storage request backing a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRequestRecord {
    pub bucket_id: BucketId,
    pub location: String,
    pub fingerprint: Fingerprint,
    pub size_bytes: u64,
    /// Provider assigned to the request and whether it has countersigned
    pub msp: Option<MspAcceptance>,
}

impl StorageRequestRecord {
    pub fn is_confirmed_by(&self, msp_id: &ProviderId) -> bool {
        self.msp
            .as_ref()
            .map(|m| m.confirmed && &m.msp_id == msp_id)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The node refused to accept the transaction
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    /// Gave up waiting; the transaction may still be included later
    #[error("timed out waiting for {operation} after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },
}

#[async_trait]
pub trait ChainClient: Send + Sync + fmt::Debug {
    async fn current_base_fee(&self) -> Result<u128, ChainError>;

    async fn submit_transaction(
        &self,
        intent: &TxIntent,
        fees: &FeeParams,
    ) -> Result<TxHash, ChainError>;

    /// Resolves once the transaction is included in a block
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError>;

    async fn read_bucket(&self, bucket_id: &BucketId) -> Result<Option<BucketRecord>, ChainError>;

    async fn read_storage_request(
        &self,
        file_key: &FileKey,
    ) -> Result<Option<StorageRequestRecord>, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_format() {
        let intent = TxIntent::DeleteBucket {
            bucket_id: BucketId::from_bytes([1; 32]),
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["call"], "deleteBucket");
        assert_eq!(json["bucketId"], format!("0x{}", "01".repeat(32)));
    }

    #[test]
    fn test_confirmed_by_assigned_provider_only() {
        let msp = ProviderId::from_bytes([1; 32]);
        let other = ProviderId::from_bytes([2; 32]);
        let mut record = StorageRequestRecord {
            bucket_id: BucketId::from_bytes([0; 32]),
            location: "a".into(),
            fingerprint: Fingerprint::from_bytes([0; 32]),
            size_bytes: 1,
            msp: Some(MspAcceptance {
                msp_id: msp,
                confirmed: false,
            }),
        };
        assert!(!record.is_confirmed_by(&msp));

        record.msp = Some(MspAcceptance {
            msp_id: msp,
            confirmed: true,
        });
        assert!(record.is_confirmed_by(&msp));
        assert!(!record.is_confirmed_by(&other));
    }
}
