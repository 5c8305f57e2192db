use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use url::Url;

use common::backend::{
    AuthApi, BackendApi, BackendError, Challenge, Download, SessionGrant, SessionProvider,
    SignedChallenge, TransferApi, UploadReceipt,
};
use common::model::{
    Address, Bucket, BucketId, FileInfo, FileKey, FileTree, MspInfo, ValueProposition,
};

use crate::api::v0::auth::{NonceRequest, VerifyRequest};
use crate::api::v0::bucket::{FilesRequest, GetBucketRequest, ListBucketsRequest};
use crate::api::v0::file::{DownloadRequest, FileInfoRequest, UploadRequest};
use crate::api::v0::provider::{HealthRequest, MspInfoRequest, ValuePropsRequest};
use crate::api::{ApiClient, ApiError, ApiRequest};

/// Indexing backend and storage-provider transfer endpoints over HTTP.
///
/// Both live behind the same base URL; the provider's upload and
///  download routes are proxied by the backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    pub fn new(remote: &Url, sessions: Arc<dyn SessionProvider>) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(remote)?.with_sessions(sessions),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Build and dispatch `request`, returning the response whatever
    ///  its status unless the session was refused
    async fn dispatch_raw<T: ApiRequest>(
        &self,
        request: T,
    ) -> Result<reqwest::Response, BackendError> {
        let builder = request.build_request(self.api.base_url(), self.api.http_client())?;
        let response = self.api.dispatch(builder).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Unauthorized(message));
        }
        Ok(response)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError> {
        Ok(self.api.call(ListBucketsRequest).await?)
    }

    async fn get_bucket(&self, bucket_id: &BucketId) -> Result<Bucket, BackendError> {
        Ok(self
            .api
            .call(GetBucketRequest {
                bucket_id: *bucket_id,
            })
            .await?)
    }

    async fn get_files(&self, bucket_id: &BucketId) -> Result<FileTree, BackendError> {
        Ok(self
            .api
            .call(FilesRequest {
                bucket_id: *bucket_id,
            })
            .await?)
    }

    async fn get_file_info(
        &self,
        bucket_id: &BucketId,
        file_key: &FileKey,
    ) -> Result<FileInfo, BackendError> {
        Ok(self
            .api
            .call(FileInfoRequest {
                bucket_id: *bucket_id,
                file_key: *file_key,
            })
            .await?)
    }

    async fn msp_info(&self) -> Result<MspInfo, BackendError> {
        Ok(self.api.call(MspInfoRequest).await?)
    }

    async fn value_propositions(&self) -> Result<Vec<ValueProposition>, BackendError> {
        Ok(self.api.call(ValuePropsRequest).await?)
    }

    async fn health(&self) -> Result<String, BackendError> {
        Ok(self.api.call(HealthRequest).await?.status)
    }
}

#[async_trait]
impl TransferApi for HttpBackend {
    async fn upload_bytes(
        &self,
        bucket_id: &BucketId,
        file_key: &FileKey,
        bytes: Bytes,
        owner: &Address,
        name: &str,
    ) -> Result<UploadReceipt, BackendError> {
        tracing::debug!(%file_key, size = bytes.len(), "uploading file bytes");
        let response = self
            .dispatch_raw(UploadRequest {
                bucket_id: *bucket_id,
                file_key: *file_key,
                owner: *owner,
                location: name.to_string(),
                bytes,
            })
            .await?;

        let status = response.status();
        let message = if status.is_success() {
            None
        } else {
            Some(response.text().await.unwrap_or_default())
        };
        Ok(UploadReceipt {
            status: status.as_u16(),
            message,
        })
    }

    async fn download_bytes(&self, file_key: &FileKey) -> Result<Download, BackendError> {
        let response = self
            .dispatch_raw(DownloadRequest {
                file_key: *file_key,
            })
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| BackendError::Unavailable(e.to_string())))
            .boxed();

        Ok(Download {
            status,
            content_type,
            stream,
        })
    }
}

/// Challenge and verify endpoints. Never sends a bearer token.
#[derive(Debug, Clone)]
pub struct HttpAuth {
    api: ApiClient,
}

impl HttpAuth {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(remote)?,
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuth {
    async fn nonce(
        &self,
        address: &Address,
        chain_id: u64,
        domain: &str,
        uri: &str,
    ) -> Result<Challenge, BackendError> {
        Ok(self
            .api
            .call(NonceRequest {
                address: *address,
                chain_id,
                domain: domain.to_string(),
                uri: uri.to_string(),
            })
            .await?)
    }

    async fn verify(&self, signed: &SignedChallenge) -> Result<SessionGrant, BackendError> {
        Ok(self.api.call(VerifyRequest(signed.clone())).await?)
    }
}
