use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::IgnoredAny;

use common::model::{Address, BucketId, FileInfo, FileKey};

use crate::api::{ApiError, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct FileInfoRequest {
    pub bucket_id: BucketId,
    pub file_key: FileKey,
}

impl ApiRequest for FileInfoRequest {
    type Response = FileInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!(
            "/buckets/{}/info/{}",
            self.bucket_id, self.file_key
        ))?;
        Ok(client.get(full_url))
    }
}

/// Multipart upload of a file's bytes to the storage provider
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bucket_id: BucketId,
    pub file_key: FileKey,
    pub owner: Address,
    pub location: String,
    pub bytes: Bytes,
}

impl ApiRequest for UploadRequest {
    type Response = IgnoredAny;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!(
            "/buckets/{}/upload/{}",
            self.bucket_id, self.file_key
        ))?;

        let mime_type = mime_guess::from_path(&self.location).first_or_octet_stream();
        let size = self.bytes.len() as u64;
        let part = Part::stream_with_length(self.bytes, size)
            .file_name(self.location.clone())
            .mime_str(mime_type.as_ref())?;
        let form = Form::new()
            .text("owner", self.owner.to_string())
            .text("location", self.location)
            .part("file", part);

        Ok(client.put(full_url).multipart(form))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest {
    pub file_key: FileKey,
}

impl ApiRequest for DownloadRequest {
    type Response = IgnoredAny;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("/download/{}", self.file_key))?;
        Ok(client.get(full_url))
    }
}
