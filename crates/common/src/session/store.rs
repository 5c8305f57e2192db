use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::Address;

/// An authenticated session with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub identity: Address,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Session {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid session file: {0}")]
    Format(String),
}

/// Short-lived persisted mirror of the in-memory session
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Must succeed when nothing is stored
    fn clear(&self) -> Result<(), SessionStoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.inner.lock().take();
        Ok(())
    }
}
