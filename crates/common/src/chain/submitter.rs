use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ChainClient, ChainError, FeeParams, Receipt, ReceiptStatus, TxIntent};
use crate::error::OperationError;

/// Fixed parts of the fee computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    /// Tip offered to the block producer, in wei
    #[serde(default = "default_priority_fee")]
    pub priority_fee: u64,
    /// Gas ceiling for every submission
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

fn default_priority_fee() -> u64 {
    1_500_000_000
}

fn default_gas_limit() -> u64 {
    5_000_000
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            priority_fee: default_priority_fee(),
            gas_limit: default_gas_limit(),
        }
    }
}

impl FeePolicy {
    /// `max_fee_per_gas = 2 * base_fee + priority_fee`
    pub fn fees_for(&self, base_fee: u128) -> FeeParams {
        let priority = self.priority_fee as u128;
        FeeParams {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority),
            max_priority_fee_per_gas: priority,
            gas_limit: self.gas_limit,
        }
    }
}

/// Submits ledger writes and interprets their receipts.
///
/// Holds no per-call state: cloning is cheap and concurrent
///  submissions of independent intents are fine.
#[derive(Debug, Clone)]
pub struct TxSubmitter {
    chain: Arc<dyn ChainClient>,
    policy: FeePolicy,
}

impl TxSubmitter {
    pub fn new(chain: Arc<dyn ChainClient>, policy: FeePolicy) -> Self {
        Self { chain, policy }
    }

    pub fn policy(&self) -> &FeePolicy {
        &self.policy
    }

    /// Submit `intent` and block until it is included.
    ///
    /// Never retries: a rejected submission or a reverted receipt is
    ///  returned to the caller, since resubmitting the same intent
    ///  may apply it twice.
    pub async fn submit(&self, intent: TxIntent) -> Result<Receipt, OperationError> {
        // base fee moves every block, so fees are never cached
        let base_fee = self.chain.current_base_fee().await?;
        let fees = self.policy.fees_for(base_fee);
        tracing::debug!(
            call = intent.name(),
            base_fee,
            max_fee_per_gas = fees.max_fee_per_gas,
            "submitting transaction"
        );

        let tx_hash = match self.chain.submit_transaction(&intent, &fees).await {
            Ok(hash) => hash,
            Err(ChainError::Rejected(reason)) => {
                tracing::warn!(call = intent.name(), %reason, "node rejected transaction");
                return Err(OperationError::SubmissionRejected(reason));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(call = intent.name(), %tx_hash, "transaction accepted, awaiting inclusion");

        let receipt = self.chain.wait_for_receipt(&tx_hash).await?;
        match receipt.status {
            ReceiptStatus::Success => {
                tracing::info!(call = intent.name(), %tx_hash, block = ?receipt.block_number, "transaction succeeded");
                Ok(receipt)
            }
            ReceiptStatus::Reverted => {
                tracing::warn!(call = intent.name(), %tx_hash, "transaction reverted");
                Err(OperationError::ExecutionReverted {
                    tx_hash,
                    message: format!("{} reverted on-chain", intent.name()),
                })
            }
        }
    }
}
