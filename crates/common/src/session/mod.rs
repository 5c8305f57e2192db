//! Authenticated-session lifecycle.
//!
//! `absent -> pending (challenge issued) -> active -> absent`
//!
//! The manager is the single owner of the session token. Transports
//!  read it through [`SessionProvider`] right before each request,
//!  so an invalidated session never leaks into a new call.

mod store;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::backend::{
    AuthApi, BackendError, Challenge, Credentials, SessionProvider, SignedChallenge,
};
use crate::error::OperationError;
use crate::model::Address;

pub use store::{MemorySessionStore, Session, SessionStore, SessionStoreError};

/// Scoping for login challenges
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Domain the challenge is bound to
    pub domain: String,
    /// Origin URI the challenge is bound to
    pub uri: String,
    pub chain_id: u64,
    /// Lifetime of a session, if the backend does not say otherwise
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Pending,
    Active,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<(Address, Challenge)>,
    active: Option<Session>,
}

#[derive(Debug)]
pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: Option<Arc<dyn SessionStore>>,
    config: SessionConfig,
    slot: RwLock<Slot>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        store: Option<Arc<dyn SessionStore>>,
        config: SessionConfig,
    ) -> Self {
        Self {
            auth,
            store,
            config,
            slot: RwLock::new(Slot::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        let slot = self.slot.read();
        match (&slot.active, &slot.pending) {
            (Some(session), _) if !session.is_expired() => SessionState::Active,
            (_, Some(_)) => SessionState::Pending,
            _ => SessionState::Absent,
        }
    }

    /// Request a signable challenge for `identity`
    pub async fn begin_challenge(&self, identity: Address) -> Result<Challenge, OperationError> {
        let challenge = self
            .auth
            .nonce(
                &identity,
                self.config.chain_id,
                &self.config.domain,
                &self.config.uri,
            )
            .await
            .map_err(|e| match e {
                BackendError::Unavailable(msg) => OperationError::BackendUnavailable(msg),
                other => OperationError::Backend(other),
            })?;

        tracing::info!(%identity, "login challenge issued");
        self.slot.write().pending = Some((identity, challenge.clone()));
        Ok(challenge)
    }

    /// Exchange a signed challenge for a session, replacing any
    ///  session held so far
    pub async fn complete_login(
        &self,
        signed: SignedChallenge,
    ) -> Result<Session, OperationError> {
        let grant = self.auth.verify(&signed).await.map_err(|e| match e {
            BackendError::Unavailable(msg) => OperationError::BackendUnavailable(msg),
            BackendError::Unauthorized(msg) => OperationError::AuthRejected(msg),
            BackendError::Status { status, message } if status == 401 || status == 403 => {
                OperationError::AuthRejected(message)
            }
            other => OperationError::Backend(other),
        })?;

        let expected = self.slot.read().pending.as_ref().map(|(identity, _)| *identity);
        if let Some(expected) = expected {
            if expected != grant.address {
                return Err(OperationError::AuthRejected(format!(
                    "challenge was issued for {} but signed by {}",
                    expected, grant.address
                )));
            }
        }

        let issued_at = OffsetDateTime::now_utc();
        let session = Session {
            token: grant.token,
            identity: grant.address,
            issued_at,
            expires_at: self.config.ttl.map(|ttl| issued_at + ttl),
        };

        if let Some(store) = &self.store {
            store
                .save(&session)
                .map_err(|e| OperationError::SessionStore(e.to_string()))?;
        }

        let previous = {
            let mut slot = self.slot.write();
            slot.pending = None;
            slot.active.replace(session.clone())
        };
        if let Some(previous) = previous {
            tracing::info!(identity = %previous.identity, "replacing previous session");
        }
        tracing::info!(identity = %session.identity, "session active");

        Ok(session)
    }

    /// Load a persisted, unexpired session into memory
    pub fn restore(&self) -> Result<Option<Session>, OperationError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let loaded = match store.load() {
            Ok(loaded) => loaded,
            Err(SessionStoreError::Format(reason)) => {
                // an unreadable file would otherwise block `logout` too
                tracing::warn!(%reason, "persisted session unreadable, discarding");
                store
                    .clear()
                    .map_err(|e| OperationError::SessionStore(e.to_string()))?;
                return Ok(None);
            }
            Err(e) => return Err(OperationError::SessionStore(e.to_string())),
        };

        match loaded {
            Some(session) if !session.is_expired() => {
                tracing::debug!(identity = %session.identity, "restored persisted session");
                self.slot.write().active = Some(session.clone());
                Ok(Some(session))
            }
            Some(_) => {
                tracing::debug!("persisted session expired, discarding");
                store
                    .clear()
                    .map_err(|e| OperationError::SessionStore(e.to_string()))?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.slot
            .read()
            .active
            .as_ref()
            .filter(|session| !session.is_expired())
            .cloned()
    }

    /// Whether `err` means the session is no longer valid
    pub fn is_auth_error(&self, err: &BackendError) -> bool {
        err.is_auth()
    }

    /// Drop the session from memory and from the persisted store.
    ///  Safe to call repeatedly.
    pub fn invalidate(&self) {
        let had_session = {
            let mut slot = self.slot.write();
            slot.pending = None;
            slot.active.take().is_some()
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
        }
        if had_session {
            tracing::info!("session invalidated");
        }
    }
}

impl SessionProvider for SessionManager {
    fn credentials(&self) -> Option<Credentials> {
        self.current_session().map(|session| Credentials {
            token: session.token,
            identity: session.identity,
        })
    }
}
