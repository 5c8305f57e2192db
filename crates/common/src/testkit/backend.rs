use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use super::{MSP_ID, VALUE_PROP_ID};
use crate::backend::{
    AuthApi, BackendApi, BackendError, Challenge, Download, SessionGrant, SessionProvider,
    SignedChallenge, TransferApi, UploadReceipt,
};
use crate::model::{
    Address, Bucket, BucketId, FileInfo, FileKey, FileStatus, FileTree, FileTreeNode, Fingerprint,
    MspInfo, ValueProposition,
};

/// Signature the mock backend accepts for `challenge`
pub fn sign_challenge(challenge: &Challenge) -> SignedChallenge {
    SignedChallenge {
        message: challenge.message.clone(),
        signature: signature_for(&challenge.message),
    }
}

fn signature_for(message: &str) -> String {
    format!("0x{}", hex::encode(blake3::hash(message.as_bytes()).as_bytes()))
}

/// Methods that need a live session
const AUTHENTICATED: &[&str] = &[
    "list_buckets",
    "get_bucket",
    "get_files",
    "get_file_info",
    "upload",
    "download",
];

#[derive(Debug)]
struct BackendState {
    msp: MspInfo,
    value_props: Vec<ValueProposition>,
    buckets: HashMap<BucketId, Bucket>,
    bucket_misses: HashMap<BucketId, u32>,
    files: HashMap<FileKey, FileInfo>,
    status_scripts: HashMap<FileKey, VecDeque<Option<FileStatus>>>,
    blobs: HashMap<FileKey, Bytes>,
    upload_status: Option<u16>,
    failures: HashMap<&'static str, VecDeque<BackendError>>,
    calls: HashMap<&'static str, usize>,
    tokens_seen: Vec<(&'static str, Option<String>)>,
    challenges: HashMap<String, Address>,
    live_tokens: HashSet<String>,
    issued: u64,
    enforce_auth: bool,
}

/// In-memory indexing backend, auth service and storage provider.
///
/// The index follows what the provider stores: an upload shows up as
///  `pending` until a status script says otherwise. Scripts are
///  consumed one step per `get_file_info` call and the last step
///  sticks; `None` steps read as not found.
#[derive(Debug, Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<BackendState>>,
    sessions: Arc<Mutex<Option<Weak<dyn SessionProvider>>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BackendState {
                msp: MspInfo {
                    msp_id: MSP_ID,
                    multiaddresses: vec![
                        "/ip4/127.0.0.1/tcp/30333/p2p/12D3KooWMockProvider".to_string(),
                    ],
                },
                value_props: vec![ValueProposition {
                    id: VALUE_PROP_ID,
                    price_per_giga_unit_per_tick: "100".to_string(),
                    data_limit: 1 << 30,
                    available: true,
                }],
                buckets: HashMap::new(),
                bucket_misses: HashMap::new(),
                files: HashMap::new(),
                status_scripts: HashMap::new(),
                blobs: HashMap::new(),
                upload_status: None,
                failures: HashMap::new(),
                calls: HashMap::new(),
                tokens_seen: Vec::new(),
                challenges: HashMap::new(),
                live_tokens: HashSet::new(),
                issued: 0,
                enforce_auth: true,
            })),
            sessions: Arc::new(Mutex::new(None)),
        }
    }

    /// Read credentials from `provider` on every call, the way an
    ///  HTTP transport would
    pub fn attach_sessions(&self, provider: Weak<dyn SessionProvider>) {
        *self.sessions.lock() = Some(provider);
    }

    /// Accept calls without a session
    pub fn open_access(&self) {
        self.inner.lock().enforce_auth = false;
    }

    /// Forget every issued token, as if sessions expired server side
    pub fn expire_sessions(&self) {
        self.inner.lock().live_tokens.clear();
    }

    /// Fail the next call to `method` with `err`
    pub fn fail_next(&self, method: &'static str, err: BackendError) {
        self.inner
            .lock()
            .failures
            .entry(method)
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.inner.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Calls across every method
    pub fn total_calls(&self) -> usize {
        self.inner.lock().calls.values().sum()
    }

    /// Token attached to every call so far, in order
    pub fn tokens_seen(&self) -> Vec<(&'static str, Option<String>)> {
        self.inner.lock().tokens_seen.clone()
    }

    pub fn set_msp_info(&self, msp: MspInfo) {
        self.inner.lock().msp = msp;
    }

    pub fn set_value_propositions(&self, props: Vec<ValueProposition>) {
        self.inner.lock().value_props = props;
    }

    /// Index `bucket` immediately
    pub fn index_bucket(&self, bucket: Bucket) {
        self.index_bucket_after(bucket, 0);
    }

    /// Index `bucket` once it has been asked for `misses` times
    pub fn index_bucket_after(&self, bucket: Bucket, misses: u32) {
        let mut state = self.inner.lock();
        state.bucket_misses.insert(bucket.bucket_id, misses);
        state.buckets.insert(bucket.bucket_id, bucket);
    }

    pub fn put_file(&self, info: FileInfo) {
        self.inner.lock().files.insert(info.file_key, info);
    }

    pub fn file(&self, file_key: &FileKey) -> Option<FileInfo> {
        self.inner.lock().files.get(file_key).cloned()
    }

    pub fn script_file_status(&self, file_key: FileKey, steps: Vec<Option<FileStatus>>) {
        self.inner
            .lock()
            .status_scripts
            .insert(file_key, steps.into());
    }

    /// Status the provider answers the next upload with
    pub fn answer_next_upload(&self, status: u16) {
        self.inner.lock().upload_status = Some(status);
    }

    fn enter(&self, method: &'static str) -> Result<(), BackendError> {
        let token = self
            .sessions
            .lock()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .and_then(|provider| provider.credentials())
            .map(|credentials| credentials.token);

        let mut state = self.inner.lock();
        *state.calls.entry(method).or_default() += 1;
        state.tokens_seen.push((method, token.clone()));

        if let Some(err) = state
            .failures
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        if state.enforce_auth && AUTHENTICATED.contains(&method) {
            match token {
                None => return Err(BackendError::NoSession),
                Some(token) if !state.live_tokens.contains(&token) => {
                    return Err(BackendError::Unauthorized("session expired".to_string()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError> {
        self.enter("list_buckets")?;
        let mut buckets: Vec<Bucket> = self.inner.lock().buckets.values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn get_bucket(&self, bucket_id: &BucketId) -> Result<Bucket, BackendError> {
        self.enter("get_bucket")?;
        let mut state = self.inner.lock();
        if let Some(misses) = state.bucket_misses.get_mut(bucket_id) {
            if *misses > 0 {
                *misses -= 1;
                return Err(BackendError::NotFound(format!("bucket {}", bucket_id)));
            }
        }
        state
            .buckets
            .get(bucket_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("bucket {}", bucket_id)))
    }

    async fn get_files(&self, bucket_id: &BucketId) -> Result<FileTree, BackendError> {
        self.enter("get_files")?;
        let state = self.inner.lock();
        let mut files: Vec<&FileInfo> = state
            .files
            .values()
            .filter(|info| &info.bucket_id == bucket_id)
            .collect();
        files.sort_by(|a, b| a.location.cmp(&b.location));

        let mut root = Vec::new();
        for info in files {
            insert_node(&mut root, &info.location, info);
        }
        Ok(FileTree {
            bucket_id: *bucket_id,
            files: root,
        })
    }

    async fn get_file_info(
        &self,
        _bucket_id: &BucketId,
        file_key: &FileKey,
    ) -> Result<FileInfo, BackendError> {
        self.enter("get_file_info")?;
        let mut state = self.inner.lock();
        let step = match state.status_scripts.get_mut(file_key) {
            Some(steps) if steps.len() > 1 => steps.pop_front(),
            Some(steps) => steps.front().copied(),
            None => None,
        };
        let not_found = || BackendError::NotFound(format!("file {}", file_key));

        match step {
            Some(None) => Err(not_found()),
            Some(Some(status)) => {
                let info = state.files.get_mut(file_key).ok_or_else(not_found)?;
                info.status = status;
                Ok(info.clone())
            }
            None => state.files.get(file_key).cloned().ok_or_else(not_found),
        }
    }

    async fn msp_info(&self) -> Result<MspInfo, BackendError> {
        self.enter("msp_info")?;
        Ok(self.inner.lock().msp.clone())
    }

    async fn value_propositions(&self) -> Result<Vec<ValueProposition>, BackendError> {
        self.enter("value_propositions")?;
        Ok(self.inner.lock().value_props.clone())
    }

    async fn health(&self) -> Result<String, BackendError> {
        self.enter("health")?;
        Ok("healthy".to_string())
    }
}

fn insert_node(nodes: &mut Vec<FileTreeNode>, path: &str, info: &FileInfo) {
    match path.split_once('/') {
        None => nodes.push(FileTreeNode::File {
            name: path.to_string(),
            file_key: info.file_key,
            size_bytes: info.size_bytes,
            status: info.status,
        }),
        Some((folder, rest)) => {
            let existing = nodes.iter_mut().find_map(|node| match node {
                FileTreeNode::Folder { name, children } if name == folder => Some(children),
                _ => None,
            });
            match existing {
                Some(children) => insert_node(children, rest, info),
                None => {
                    let mut children = Vec::new();
                    insert_node(&mut children, rest, info);
                    nodes.push(FileTreeNode::Folder {
                        name: folder.to_string(),
                        children,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl AuthApi for MockBackend {
    async fn nonce(
        &self,
        address: &Address,
        chain_id: u64,
        domain: &str,
        uri: &str,
    ) -> Result<Challenge, BackendError> {
        self.enter("nonce")?;
        let mut state = self.inner.lock();
        state.issued += 1;
        let message = format!(
            "{} wants you to sign in with your account:\n{}\n\nURI: {}\nChain ID: {}\nNonce: {}",
            domain, address, uri, chain_id, state.issued
        );
        state.challenges.insert(message.clone(), *address);
        Ok(Challenge { message })
    }

    async fn verify(&self, signed: &SignedChallenge) -> Result<SessionGrant, BackendError> {
        self.enter("verify")?;
        let mut state = self.inner.lock();
        let address = *state
            .challenges
            .get(&signed.message)
            .ok_or_else(|| BackendError::Unauthorized("unknown challenge".to_string()))?;
        if signed.signature != signature_for(&signed.message) {
            return Err(BackendError::Unauthorized("invalid signature".to_string()));
        }

        state.challenges.remove(&signed.message);
        state.issued += 1;
        let token = format!("token-{}", state.issued);
        state.live_tokens.insert(token.clone());
        Ok(SessionGrant { token, address })
    }
}

#[async_trait]
impl TransferApi for MockBackend {
    async fn upload_bytes(
        &self,
        bucket_id: &BucketId,
        file_key: &FileKey,
        bytes: Bytes,
        owner: &Address,
        name: &str,
    ) -> Result<UploadReceipt, BackendError> {
        self.enter("upload")?;
        let mut state = self.inner.lock();
        if let Some(status) = state.upload_status.take() {
            if !(200..300).contains(&status) {
                return Ok(UploadReceipt {
                    status,
                    message: Some("provider refused the upload".to_string()),
                });
            }
        }

        state.files.entry(*file_key).or_insert_with(|| FileInfo {
            file_key: *file_key,
            fingerprint: Fingerprint::from_bytes(*blake3::hash(&bytes).as_bytes()),
            bucket_id: *bucket_id,
            owner: *owner,
            location: name.to_string(),
            size_bytes: bytes.len() as u64,
            status: FileStatus::Pending,
        });
        state.blobs.insert(*file_key, bytes);
        Ok(UploadReceipt {
            status: 201,
            message: None,
        })
    }

    async fn download_bytes(&self, file_key: &FileKey) -> Result<Download, BackendError> {
        self.enter("download")?;
        let blob = self.inner.lock().blobs.get(file_key).cloned();
        Ok(match blob {
            Some(bytes) => Download {
                status: 200,
                content_type: Some("application/octet-stream".to_string()),
                stream: stream::once(async move { Ok(bytes) }).boxed(),
            },
            None => Download {
                status: 404,
                content_type: None,
                stream: stream::empty().boxed(),
            },
        })
    }
}
