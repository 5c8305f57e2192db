#![allow(dead_code)]

use bytes::Bytes;
use common::addressing::{Blake3Addressing, ContentAddressing};
use common::model::{Bucket, FileInfo, FileKey, FileStatus};
use common::testkit::{TestHarness, ALICE};

/// Harness with a signed-in session and an empty bucket named `name`
pub async fn setup_with_bucket(name: &str) -> (TestHarness, Bucket) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let harness = TestHarness::new();
    harness.login().await.unwrap();
    let bucket = harness.create_bucket(name).await.unwrap();
    (harness, bucket)
}

pub fn file_key(bucket: &Bucket, name: &str) -> FileKey {
    Blake3Addressing.derive_file_key(&ALICE, &bucket.bucket_id, name)
}

/// Put a ready file straight into the index
pub fn seed_file(harness: &TestHarness, bucket: &Bucket, name: &str, bytes: &[u8]) -> FileKey {
    let key = file_key(bucket, name);
    harness.backend.put_file(FileInfo {
        file_key: key,
        fingerprint: Blake3Addressing.fingerprint(bytes),
        bucket_id: bucket.bucket_id,
        owner: ALICE,
        location: name.to_string(),
        size_bytes: bytes.len() as u64,
        status: FileStatus::Ready,
    });
    key
}

pub fn payload(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| i as u8).collect::<Vec<_>>())
}
