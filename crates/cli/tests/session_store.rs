//! The file-backed session store as seen by the session manager:
//!  one command signs in, the next one picks the session up.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use common::backend::{BackendApi, SessionProvider};
use common::session::{Session, SessionManager, SessionStore};
use common::testkit::{sign_challenge, MockBackend, ALICE};
use hubstore_cli::state::{AppConfig, FileSessionStore, SESSION_FILE_NAME};

fn manager(backend: &MockBackend, dir: &Path) -> Arc<SessionManager> {
    let session = Arc::new(SessionManager::new(
        Arc::new(backend.clone()),
        Some(Arc::new(FileSessionStore::new(dir.join(SESSION_FILE_NAME)))),
        AppConfig::default().session_config(),
    ));
    let provider: Arc<dyn SessionProvider> = session.clone();
    backend.attach_sessions(Arc::downgrade(&provider));
    session
}

#[tokio::test]
async fn test_session_survives_between_commands() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();

    let first = manager(&backend, dir.path());
    let challenge = first.begin_challenge(ALICE).await.unwrap();
    let session = first
        .complete_login(sign_challenge(&challenge))
        .await
        .unwrap();
    assert!(session.expires_at.is_some());
    drop(first);

    let second = manager(&backend, dir.path());
    assert_eq!(second.current_session(), None);
    let restored = second.restore().unwrap().unwrap();
    assert_eq!(restored.token, session.token);
    assert_eq!(restored.identity, ALICE);

    backend.list_buckets().await.unwrap();
    assert_eq!(
        backend.tokens_seen().last().cloned(),
        Some(("list_buckets", Some(session.token.clone())))
    );

    second.invalidate();
    assert!(!dir.path().join(SESSION_FILE_NAME).exists());
}

#[tokio::test]
async fn test_unreadable_session_file_is_discarded_on_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SESSION_FILE_NAME);
    std::fs::write(&path, "{ truncated").unwrap();

    let backend = MockBackend::new();
    let session = manager(&backend, dir.path());
    assert_eq!(session.restore().unwrap(), None);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_expired_session_is_discarded_on_restore() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join(SESSION_FILE_NAME));
    let issued_at = OffsetDateTime::now_utc() - Duration::from_secs(7200);
    store
        .save(&Session {
            token: "stale".into(),
            identity: ALICE,
            issued_at,
            expires_at: Some(issued_at + Duration::from_secs(3600)),
        })
        .unwrap();

    let backend = MockBackend::new();
    let session = manager(&backend, dir.path());
    assert_eq!(session.restore().unwrap(), None);
    assert_eq!(store.load().unwrap(), None);
}
