use reqwest::{Client, RequestBuilder, Url};

use common::model::{Bucket, BucketId, FileTree};

use crate::api::{ApiError, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct ListBucketsRequest;

impl ApiRequest for ListBucketsRequest {
    type Response = Vec<Bucket>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(base_url.join("/buckets")?))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetBucketRequest {
    pub bucket_id: BucketId,
}

impl ApiRequest for GetBucketRequest {
    type Response = Bucket;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("/buckets/{}", self.bucket_id))?;
        Ok(client.get(full_url))
    }
}

/// Folder tree of everything indexed in a bucket
#[derive(Debug, Clone, Copy)]
pub struct FilesRequest {
    pub bucket_id: BucketId,
}

impl ApiRequest for FilesRequest {
    type Response = FileTree;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("/buckets/{}/files", self.bucket_id))?;
        Ok(client.get(full_url))
    }
}
