use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::model::{MspInfo, ValueProposition};

use crate::api::{ApiError, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct HealthRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl ApiRequest for HealthRequest {
    type Response = HealthResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(base_url.join("/health")?))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MspInfoRequest;

impl ApiRequest for MspInfoRequest {
    type Response = MspInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(base_url.join("/info")?))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValuePropsRequest;

impl ApiRequest for ValuePropsRequest {
    type Response = Vec<ValueProposition>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(base_url.join("/value-props")?))
    }
}
