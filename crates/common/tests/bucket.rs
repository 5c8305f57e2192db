//! Integration tests for bucket creation and deletion

mod common;

use ::common::chain::TxIntent;
use ::common::error::OperationError;
use ::common::ops::{
    available_value_propositions, create_bucket, delete_bucket, list_buckets, CreateBucket,
};
use ::common::progress::{BucketStep, Progress};
use ::common::testkit::{TestHarness, MSP_ID, VALUE_PROP_ID};

fn request(name: &str) -> CreateBucket {
    CreateBucket {
        name: name.to_string(),
        msp_id: MSP_ID,
        value_prop_id: VALUE_PROP_ID,
        is_private: true,
    }
}

async fn signed_in() -> TestHarness {
    let harness = TestHarness::new();
    harness.login().await.unwrap();
    harness
}

#[tokio::test]
async fn test_create_bucket_waits_for_index() {
    let harness = signed_in().await;
    harness
        .backend
        .index_bucket_after(harness.bucket("docs"), 2);

    let (progress, rx) = Progress::channel("create bucket", BucketStep::Creating);
    let bucket = create_bucket(&harness.ctx, request("docs"), &progress)
        .await
        .unwrap();

    assert_eq!(bucket.bucket_id, harness.bucket_id("docs"));
    assert_eq!(*rx.borrow(), BucketStep::Done);
    assert_eq!(harness.backend.calls("get_bucket"), 3);

    let record = harness.chain.bucket(&bucket.bucket_id).unwrap();
    assert!(record.private);
    assert_eq!(record.msp_id, Some(MSP_ID));
}

#[tokio::test]
async fn test_missing_ledger_record_fails_verification() {
    let harness = signed_in().await;
    harness.chain.drop_bucket_records();
    harness.backend.index_bucket(harness.bucket("docs"));

    let (progress, rx) = Progress::channel("create bucket", BucketStep::Creating);
    let err = create_bucket(&harness.ctx, request("docs"), &progress)
        .await
        .unwrap_err();

    match err {
        OperationError::VerificationFailed(id) => assert_eq!(id, harness.bucket_id("docs")),
        other => panic!("expected verification failure, got {:?}", other),
    }
    assert_eq!(*rx.borrow(), BucketStep::Error);
    assert_eq!(harness.backend.calls("get_bucket"), 0);
}

#[tokio::test]
async fn test_bucket_never_indexed_times_out() {
    let harness = signed_in().await;

    let err = create_bucket(&harness.ctx, request("docs"), &Progress::silent("create bucket"))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(harness.chain.bucket(&harness.bucket_id("docs")).is_some());
}

#[tokio::test]
async fn test_rejected_submission_never_waits() {
    let harness = signed_in().await;
    harness.chain.reject_next_submission("insufficient balance");

    let err = create_bucket(&harness.ctx, request("docs"), &Progress::silent("create bucket"))
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::SubmissionRejected(_)));
    assert_eq!(harness.chain.receipt_waits(), 0);
}

#[tokio::test]
async fn test_delete_bucket() {
    let (harness, bucket) = common::setup_with_bucket("docs").await;

    delete_bucket(&harness.ctx, &bucket.bucket_id).await.unwrap();

    assert!(harness.chain.bucket(&bucket.bucket_id).is_none());
    let (intent, _) = harness.chain.submissions().pop().unwrap();
    assert_eq!(
        intent,
        TxIntent::DeleteBucket {
            bucket_id: bucket.bucket_id
        }
    );
    assert_eq!(harness.chain.receipt_waits(), 2);
}

#[tokio::test]
async fn test_delete_non_empty_bucket_reverts() {
    let (harness, bucket) = common::setup_with_bucket("docs").await;
    let backend_calls = harness.backend.total_calls();
    harness.chain.revert_next_receipt();

    let err = delete_bucket(&harness.ctx, &bucket.bucket_id)
        .await
        .unwrap_err();

    match err {
        OperationError::ExecutionReverted { message, .. } => {
            assert!(message.contains("must hold no files"))
        }
        other => panic!("expected revert, got {:?}", other),
    }
    assert_eq!(harness.backend.total_calls(), backend_calls);
    assert!(harness.chain.bucket(&bucket.bucket_id).is_some());
}

#[tokio::test]
async fn test_list_buckets() {
    let (harness, _) = common::setup_with_bucket("b").await;
    harness.create_bucket("a").await.unwrap();

    let names: Vec<_> = list_buckets(&harness.ctx)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_only_available_offers_listed() {
    let harness = TestHarness::new();
    let mut props = available_value_propositions(&harness.ctx).await.unwrap();
    assert_eq!(props.len(), 1);

    props[0].available = false;
    harness.backend.set_value_propositions(props);
    assert!(available_value_propositions(&harness.ctx)
        .await
        .unwrap()
        .is_empty());
}
