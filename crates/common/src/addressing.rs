//! Content addressing: fingerprints and deterministic identifiers.
//!
//! Ledgers differ in how they hash bucket and file identifiers, so
//! the orchestrators only see the [`ContentAddressing`] trait. The
//! bundled [`Blake3Addressing`] uses domain-separated blake3 and is
//! what the in-memory testkit and the default CLI wiring use.

use crate::model::{Address, BucketId, FileKey, Fingerprint};

const BUCKET_ID_CONTEXT: &str = "hubstore 2024-06 bucket id";
const FILE_KEY_CONTEXT: &str = "hubstore 2024-06 file key";

pub trait ContentAddressing: Send + Sync + std::fmt::Debug {
    /// Content hash of the raw bytes
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint;

    /// Key of the file `name` inside `bucket_id`, owned by `owner`
    fn derive_file_key(&self, owner: &Address, bucket_id: &BucketId, name: &str) -> FileKey;

    /// Id of the bucket `name` owned by `owner`
    fn derive_bucket_id(&self, owner: &Address, name: &str) -> BucketId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Addressing;

impl ContentAddressing for Blake3Addressing {
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        Fingerprint::from_bytes(*blake3::hash(bytes).as_bytes())
    }

    fn derive_file_key(&self, owner: &Address, bucket_id: &BucketId, name: &str) -> FileKey {
        let mut hasher = blake3::Hasher::new_derive_key(FILE_KEY_CONTEXT);
        hasher.update(owner.as_bytes());
        hasher.update(bucket_id.as_bytes());
        update_prefixed(&mut hasher, name.as_bytes());
        FileKey::from_bytes(*hasher.finalize().as_bytes())
    }

    fn derive_bucket_id(&self, owner: &Address, name: &str) -> BucketId {
        let mut hasher = blake3::Hasher::new_derive_key(BUCKET_ID_CONTEXT);
        hasher.update(owner.as_bytes());
        update_prefixed(&mut hasher, name.as_bytes());
        BucketId::from_bytes(*hasher.finalize().as_bytes())
    }
}

// length prefix keeps ("ab", "c") and ("a", "bc") apart
fn update_prefixed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
