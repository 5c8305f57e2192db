//! JSON-RPC ledger client against an in-process axum gateway

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

use client::RpcChainClient;
use common::chain::{
    ChainClient, ChainError, FeeParams, FeePolicy, ReceiptStatus, TxIntent, TxSubmitter,
};
use common::model::{Address, BucketId, FileKey, TxHash};
use common::poll::PollPolicy;

const SENDER: Address = Address::from_bytes([0xa1; 20]);
const TX: TxHash = TxHash::from_bytes([9; 32]);

#[derive(Debug, Default)]
struct Gateway {
    calls: Vec<(String, Value)>,
    receipt_misses: u32,
    reject_submissions: bool,
}

type Shared = Arc<Mutex<Gateway>>;

async fn rpc(State(gateway): State<Shared>, Json(req): Json<Value>) -> Json<Value> {
    let method = req["method"].as_str().unwrap_or_default().to_string();
    let params = req["params"].clone();
    let id = req["id"].clone();

    let mut gw = gateway.lock();
    gw.calls.push((method.clone(), params));

    let outcome = match method.as_str() {
        "chain_baseFee" => Ok(json!("0x3b9aca00")),
        "ledger_submit" if gw.reject_submissions => Err("insufficient balance"),
        "ledger_submit" => Ok(json!(TX.to_hex())),
        "ledger_receipt" if gw.receipt_misses > 0 => {
            gw.receipt_misses -= 1;
            Ok(Value::Null)
        }
        "ledger_receipt" => Ok(json!({
            "status": "success",
            "transactionHash": TX.to_hex(),
            "blockNumber": 12,
        })),
        "ledger_bucket" => Ok(json!({
            "owner": SENDER.to_hex(),
            "mspId": null,
            "private": true,
            "valuePropId": null,
        })),
        "ledger_storageRequest" => Ok(Value::Null),
        _ => Err("method not found"),
    };

    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message },
        }),
    })
}

async fn gateway() -> (RpcChainClient, Shared) {
    let shared = Shared::default();
    let router = Router::new()
        .route("/", post(rpc))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let url = Url::parse(&format!("http://{}/", addr)).unwrap();
    let client = RpcChainClient::new(&url, SENDER)
        .unwrap()
        .with_receipt_policy(PollPolicy::new(5, 5));
    (client, shared)
}

fn fees() -> FeeParams {
    FeeParams {
        max_fee_per_gas: 3_500_000_000,
        max_priority_fee_per_gas: 1_500_000_000,
        gas_limit: 5_000_000,
    }
}

#[tokio::test]
async fn test_base_fee() {
    let (client, _) = gateway().await;
    assert_eq!(client.current_base_fee().await.unwrap(), 1_000_000_000);
}

#[tokio::test]
async fn test_submit_carries_sender_and_fees() {
    let (client, shared) = gateway().await;
    let intent = TxIntent::DeleteBucket {
        bucket_id: BucketId::from_bytes([4; 32]),
    };

    let tx_hash = client.submit_transaction(&intent, &fees()).await.unwrap();
    assert_eq!(tx_hash, TX);

    let (method, params) = shared.lock().calls.last().cloned().unwrap();
    assert_eq!(method, "ledger_submit");
    assert_eq!(params[0]["from"], json!(SENDER.to_hex()));
    assert_eq!(params[0]["intent"]["call"], json!("deleteBucket"));
    assert_eq!(params[0]["fees"]["gasLimit"], json!(5_000_000));
}

#[tokio::test]
async fn test_node_rejection() {
    let (client, shared) = gateway().await;
    shared.lock().reject_submissions = true;
    let intent = TxIntent::DeleteBucket {
        bucket_id: BucketId::from_bytes([4; 32]),
    };

    let err = client
        .submit_transaction(&intent, &fees())
        .await
        .unwrap_err();
    assert_eq!(err, ChainError::Rejected("insufficient balance".into()));
}

#[tokio::test]
async fn test_receipt_polled_until_present() {
    let (client, shared) = gateway().await;
    shared.lock().receipt_misses = 2;

    let receipt = client.wait_for_receipt(&TX).await.unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Success);
    assert_eq!(receipt.block_number, Some(12));

    let receipt_calls = shared
        .lock()
        .calls
        .iter()
        .filter(|(method, _)| method == "ledger_receipt")
        .count();
    assert_eq!(receipt_calls, 3);
}

#[tokio::test]
async fn test_receipt_never_available() {
    let (client, shared) = gateway().await;
    shared.lock().receipt_misses = 100;

    let err = client.wait_for_receipt(&TX).await.unwrap_err();
    assert!(matches!(err, ChainError::Timeout { attempts: 5, .. }));
}

#[tokio::test]
async fn test_submit_reports_receipt_timeout() {
    let (client, shared) = gateway().await;
    shared.lock().receipt_misses = 100;
    let submitter = TxSubmitter::new(Arc::new(client), FeePolicy::default());

    let err = submitter
        .submit(TxIntent::DeleteBucket {
            bucket_id: BucketId::from_bytes([4; 32]),
        })
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_reads() {
    let (client, _) = gateway().await;

    let record = client
        .read_bucket(&BucketId::from_bytes([4; 32]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.owner, SENDER);
    assert!(record.private);
    assert_eq!(record.size_bytes, 0);

    let request = client
        .read_storage_request(&FileKey::from_bytes([5; 32]))
        .await
        .unwrap();
    assert!(request.is_none());
}
