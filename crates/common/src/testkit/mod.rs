//! In-process stand-ins for the ledger, the indexing backend and the
//!  storage provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testkit::TestHarness;
//!
//! #[tokio::test]
//! async fn test_upload() {
//!     let harness = TestHarness::new();
//!     harness.login().await.unwrap();
//!
//!     let bucket = harness.create_bucket("photos").await.unwrap();
//!     harness.backend.script_file_status(key, vec![Some(FileStatus::Ready)]);
//!     // ...
//! }
//! ```

mod backend;
mod chain;

use std::sync::Arc;

use crate::addressing::{Blake3Addressing, ContentAddressing};
use crate::backend::SessionProvider;
use crate::chain::FeePolicy;
use crate::context::{Collaborators, StorageContext};
use crate::error::OperationError;
use crate::model::{Address, Bucket, BucketId, ProviderId, ValuePropId};
use crate::ops::{create_bucket, CreateBucket};
use crate::poll::{PollPolicies, PollPolicy};
use crate::progress::Progress;
use crate::session::{MemorySessionStore, Session, SessionConfig, SessionManager};

pub use backend::{sign_challenge, MockBackend};
pub use chain::MockChain;

/// Identity every harness wallet signs as
pub const ALICE: Address = Address::from_bytes([0xa1; 20]);
/// Provider the mock backend answers for
pub const MSP_ID: ProviderId = ProviderId::from_bytes([0x4d; 32]);
pub const VALUE_PROP_ID: ValuePropId = ValuePropId::from_bytes([7; 32]);

/// Poll policies measured in milliseconds, for tests
pub fn fast_policies() -> PollPolicies {
    PollPolicies {
        confirmation: PollPolicy::new(5, 10),
        index_visibility: PollPolicy::new(5, 10),
        readiness: PollPolicy::new(5, 20),
        deletion: PollPolicy::new(5, 20),
    }
}

/// A [`StorageContext`] wired to mocks, with the wallet connected
pub struct TestHarness {
    pub chain: MockChain,
    pub backend: MockBackend,
    pub store: Arc<MemorySessionStore>,
    pub session: Arc<SessionManager>,
    pub ctx: StorageContext,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_policies(fast_policies())
    }

    pub fn with_policies(policies: PollPolicies) -> Self {
        let chain = MockChain::with_sender(ALICE);
        let backend = MockBackend::new();
        let store = Arc::new(MemorySessionStore::new());
        let session = Arc::new(SessionManager::new(
            Arc::new(backend.clone()),
            Some(store.clone()),
            SessionConfig {
                domain: "hub.test".to_string(),
                uri: "https://hub.test".to_string(),
                chain_id: 1337,
                ttl: None,
            },
        ));
        let provider: Arc<dyn SessionProvider> = session.clone();
        backend.attach_sessions(Arc::downgrade(&provider));

        let ctx = StorageContext::new(
            Collaborators {
                chain: Arc::new(chain.clone()),
                backend: Arc::new(backend.clone()),
                transfer: Arc::new(backend.clone()),
                addressing: Arc::new(Blake3Addressing),
            },
            session.clone(),
            FeePolicy::default(),
            policies,
        );
        ctx.connect_wallet(ALICE);

        Self {
            chain,
            backend,
            store,
            session,
            ctx,
        }
    }

    /// Sign in as [`ALICE`]
    pub async fn login(&self) -> Result<Session, OperationError> {
        let challenge = self.session.begin_challenge(ALICE).await?;
        self.session
            .complete_login(sign_challenge(&challenge))
            .await
    }

    pub fn bucket_id(&self, name: &str) -> BucketId {
        Blake3Addressing.derive_bucket_id(&ALICE, name)
    }

    /// Index entry the backend would produce for a bucket named `name`
    pub fn bucket(&self, name: &str) -> Bucket {
        Bucket {
            bucket_id: self.bucket_id(name),
            name: name.to_string(),
            owner: ALICE,
            msp_id: MSP_ID,
            is_private: false,
            value_prop_id: VALUE_PROP_ID,
            file_count: 0,
            size_bytes: 0,
        }
    }

    /// Create `name` through the real operation, with the index
    ///  listing it right away
    pub async fn create_bucket(&self, name: &str) -> Result<Bucket, OperationError> {
        self.backend.index_bucket(self.bucket(name));
        create_bucket(
            &self.ctx,
            CreateBucket {
                name: name.to_string(),
                msp_id: MSP_ID,
                value_prop_id: VALUE_PROP_ID,
                is_private: false,
            },
            &Progress::silent("create bucket"),
        )
        .await
    }
}
