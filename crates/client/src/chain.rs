//! JSON-RPC 2.0 client for the ledger gateway.
//!
//! The gateway signs on behalf of the configured account, the way an
//!  unlocked node account would, so submissions only carry the sender
//!  address, the call and its fee parameters.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use common::chain::{
    BucketRecord, ChainClient, ChainError, FeeParams, Receipt, StorageRequestRecord, TxIntent,
};
use common::error::OperationError;
use common::model::{Address, BucketId, FileKey, TxHash};
use common::poll::{poll_until, PollPolicy, Probe};

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Submission<'a> {
    from: Address,
    intent: &'a TxIntent,
    fees: &'a FeeParams,
}

#[derive(Debug)]
pub struct RpcChainClient {
    endpoint: Url,
    client: Client,
    sender: Address,
    receipt_policy: PollPolicy,
    next_id: AtomicU64,
}

impl RpcChainClient {
    pub fn new(endpoint: &Url, sender: Address) -> Result<Self, ChainError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.clone(),
            client,
            sender,
            receipt_policy: PollPolicy::new(1_000, 120),
            next_id: AtomicU64::new(1),
        })
    }

    /// How often and how long to ask for a receipt before giving up
    pub fn with_receipt_policy(mut self, policy: PollPolicy) -> Self {
        self.receipt_policy = policy;
        self
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    async fn request<P, T>(&self, method: &str, params: P) -> Result<Option<T>, ChainError>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(method, id, "rpc request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        if let Some(error) = body.error {
            tracing::debug!(method, code = error.code, message = %error.message, "rpc error");
            return Err(ChainError::Rejected(error.message));
        }
        Ok(body.result)
    }

    async fn request_some<P, T>(&self, method: &str, params: P) -> Result<T, ChainError>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        self.request(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("{} returned no result", method)))
    }
}

fn parse_quantity(quantity: &str) -> Result<u128, ChainError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Decode(format!("quantity {} is not 0x-prefixed", quantity)))?;
    u128::from_str_radix(digits, 16).map_err(|e| ChainError::Decode(e.to_string()))
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn current_base_fee(&self) -> Result<u128, ChainError> {
        let quantity: String = self.request_some("chain_baseFee", [(); 0]).await?;
        parse_quantity(&quantity)
    }

    async fn submit_transaction(
        &self,
        intent: &TxIntent,
        fees: &FeeParams,
    ) -> Result<TxHash, ChainError> {
        let tx_hash: TxHash = self
            .request_some(
                "ledger_submit",
                [Submission {
                    from: self.sender,
                    intent,
                    fees,
                }],
            )
            .await?;
        tracing::debug!(call = intent.name(), %tx_hash, "transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        poll_until(
            "transaction receipt",
            self.receipt_policy,
            &CancellationToken::new(),
            move || async move {
                match self.request::<_, Receipt>("ledger_receipt", [tx_hash]).await {
                    Ok(Some(receipt)) => Ok(Probe::Satisfied(receipt)),
                    Ok(None) => Ok(Probe::NotYetVisible),
                    Err(e) => Err(OperationError::Chain(e)),
                }
            },
        )
        .await
        .map_err(|e| match e {
            OperationError::Chain(e) => e,
            OperationError::Timeout {
                operation,
                attempts,
            } => ChainError::Timeout {
                operation,
                attempts,
            },
            other => ChainError::Transport(other.to_string()),
        })
    }

    async fn read_bucket(&self, bucket_id: &BucketId) -> Result<Option<BucketRecord>, ChainError> {
        self.request("ledger_bucket", [bucket_id]).await
    }

    async fn read_storage_request(
        &self,
        file_key: &FileKey,
    ) -> Result<Option<StorageRequestRecord>, ChainError> {
        self.request("ledger_storageRequest", [file_key]).await
    }
}
