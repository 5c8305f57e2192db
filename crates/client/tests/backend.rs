//! HTTP backend client against an in-process axum server

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bytes::Bytes;
use futures::TryStreamExt;
use parking_lot::Mutex;
use serde_json::json;
use url::Url;

use client::{HttpAuth, HttpBackend};
use common::backend::{
    AuthApi, BackendApi, BackendError, Credentials, SessionProvider, SignedChallenge, TransferApi,
};
use common::model::{Address, BucketId, FileKey, FileStatus};

const BUCKET: BucketId = BucketId::from_bytes([1; 32]);
const FILE: FileKey = FileKey::from_bytes([2; 32]);
const OWNER: Address = Address::from_bytes([3; 20]);

#[derive(Debug, Default)]
struct Sessions(Mutex<Option<Credentials>>);

impl Sessions {
    fn set(&self, token: Option<&str>) {
        *self.0.lock() = token.map(|token| Credentials {
            token: token.to_string(),
            identity: OWNER,
        });
    }
}

impl SessionProvider for Sessions {
    fn credentials(&self) -> Option<Credentials> {
        self.0.lock().clone()
    }
}

#[derive(Debug, Clone, Default)]
struct Recorded {
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    upload_fields: Arc<Mutex<Vec<(String, Option<String>, Bytes)>>>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn list_buckets(State(rec): State<Recorded>, headers: HeaderMap) -> Response {
    let auth = bearer(&headers);
    rec.auth_headers.lock().push(auth.clone());
    if auth.as_deref() == Some("Bearer expired") {
        return (StatusCode::UNAUTHORIZED, "token expired").into_response();
    }
    Json(json!([{
        "bucketId": BUCKET.to_hex(),
        "name": "photos",
        "owner": OWNER.to_hex(),
        "mspId": format!("0x{}", "4d".repeat(32)),
        "isPrivate": false,
        "valuePropId": format!("0x{}", "07".repeat(32)),
    }]))
    .into_response()
}

async fn get_bucket(Path(_id): Path<String>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, "sign in first").into_response();
    }
    (StatusCode::NOT_FOUND, "bucket not indexed").into_response()
}

async fn file_info(Path((_bucket, _key)): Path<(String, String)>) -> Response {
    Json(json!({
        "fileKey": FILE.to_hex(),
        "fingerprint": format!("0x{}", "aa".repeat(32)),
        "bucketId": BUCKET.to_hex(),
        "owner": OWNER.to_hex(),
        "location": "photos/cat.jpg",
        "sizeBytes": 42,
        "status": "deletionInProgress",
    }))
    .into_response()
}

async fn upload(
    State(rec): State<Recorded>,
    Path((_bucket, _key)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let Ok(data) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        rec.upload_fields.lock().push((name, content_type, data));
    }
    (StatusCode::CREATED, "stored").into_response()
}

async fn download(Path(_key): Path<String>) -> Response {
    (
        [(header::CONTENT_TYPE, "image/jpeg")],
        Bytes::from_static(b"jpeg bytes"),
    )
        .into_response()
}

async fn nonce(Json(body): Json<serde_json::Value>) -> Response {
    let message = format!(
        "{} wants you to sign in with your account:\n{}\nChain ID: {}",
        body["domain"].as_str().unwrap_or_default(),
        body["address"].as_str().unwrap_or_default(),
        body["chainId"]
    );
    Json(json!({ "message": message })).into_response()
}

async fn verify(Json(body): Json<serde_json::Value>) -> Response {
    if body["signature"] != "0xsigned" {
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }
    Json(json!({ "token": "jwt-1", "address": OWNER.to_hex() })).into_response()
}

async fn serve() -> (Url, Recorded) {
    let rec = Recorded::default();
    let router = Router::new()
        .route("/buckets", get(list_buckets))
        .route("/buckets/:id", get(get_bucket))
        .route("/buckets/:id/info/:key", get(file_info))
        .route("/buckets/:id/upload/:key", put(upload))
        .route("/download/:key", get(download))
        .route("/auth/nonce", post(nonce))
        .route("/auth/verify", post(verify))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (Url::parse(&format!("http://{}", addr)).unwrap(), rec)
}

async fn backend() -> (HttpBackend, Arc<Sessions>, Recorded) {
    let (url, rec) = serve().await;
    let sessions = Arc::new(Sessions::default());
    let backend = HttpBackend::new(&url, sessions.clone()).unwrap();
    (backend, sessions, rec)
}

#[tokio::test]
async fn test_token_read_before_each_request() {
    let (backend, sessions, rec) = backend().await;

    sessions.set(Some("t1"));
    let buckets = backend.list_buckets().await.unwrap();
    assert_eq!(buckets[0].name, "photos");
    assert_eq!(buckets[0].bucket_id, BUCKET);

    sessions.set(None);
    backend.list_buckets().await.unwrap();

    assert_eq!(
        *rec.auth_headers.lock(),
        vec![Some("Bearer t1".to_string()), None]
    );
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let (backend, sessions, _) = backend().await;
    sessions.set(Some("expired"));

    let err = backend.list_buckets().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_unauthorized_without_token_is_no_session() {
    let (backend, sessions, _) = backend().await;

    let err = backend.get_bucket(&BUCKET).await.unwrap_err();
    assert_eq!(err, BackendError::NoSession);

    sessions.set(Some("t1"));
    let err = backend.get_bucket(&BUCKET).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_bucket_is_not_found() {
    let (backend, sessions, _) = backend().await;
    sessions.set(Some("t1"));

    let err = backend.get_bucket(&BUCKET).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_file_info_decodes() {
    let (backend, _, _) = backend().await;

    let info = backend.get_file_info(&BUCKET, &FILE).await.unwrap();
    assert_eq!(info.file_key, FILE);
    assert_eq!(info.size_bytes, 42);
    assert_eq!(info.status, FileStatus::DeletionInProgress);
}

#[tokio::test]
async fn test_upload_sends_multipart() {
    let (backend, sessions, rec) = backend().await;
    sessions.set(Some("t1"));

    let receipt = backend
        .upload_bytes(
            &BUCKET,
            &FILE,
            Bytes::from_static(b"meow"),
            &OWNER,
            "photos/cat.jpg",
        )
        .await
        .unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.status, 201);

    let fields = rec.upload_fields.lock().clone();
    let names: Vec<_> = fields.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["owner", "location", "file"]);
    assert_eq!(fields[0].2, Bytes::from(OWNER.to_string()));
    assert_eq!(fields[2].1.as_deref(), Some("image/jpeg"));
    assert_eq!(fields[2].2, Bytes::from_static(b"meow"));
}

#[tokio::test]
async fn test_download_streams_body() {
    let (backend, _, _) = backend().await;

    let download = backend.download_bytes(&FILE).await.unwrap();
    assert!(download.is_success());
    assert_eq!(download.content_type.as_deref(), Some("image/jpeg"));

    let chunks: Vec<Bytes> = download.stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"jpeg bytes".to_vec());
}

#[tokio::test]
async fn test_auth_round_trip() {
    let (url, _) = serve().await;
    let auth = HttpAuth::new(&url).unwrap();

    let challenge = auth
        .nonce(&OWNER, 1337, "hub.test", "https://hub.test")
        .await
        .unwrap();
    assert!(challenge.message.starts_with("hub.test wants you to sign in"));
    assert!(challenge.message.contains("Chain ID: 1337"));

    let grant = auth
        .verify(&SignedChallenge {
            message: challenge.message.clone(),
            signature: "0xsigned".into(),
        })
        .await
        .unwrap();
    assert_eq!(grant.token, "jwt-1");
    assert_eq!(grant.address, OWNER);

    let err = auth
        .verify(&SignedChallenge {
            message: challenge.message,
            signature: "0xforged".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized(_)));
}
