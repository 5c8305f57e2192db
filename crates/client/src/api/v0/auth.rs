use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::backend::{Challenge, SessionGrant, SignedChallenge};
use common::model::Address;

use crate::api::{ApiError, ApiRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceRequest {
    pub address: Address,
    pub chain_id: u64,
    pub domain: String,
    pub uri: String,
}

impl ApiRequest for NonceRequest {
    type Response = Challenge;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/auth/nonce")?;
        Ok(client.post(full_url).json(&self))
    }
}

#[derive(Debug, Clone)]
pub struct VerifyRequest(pub SignedChallenge);

impl ApiRequest for VerifyRequest {
    type Response = SessionGrant;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/auth/verify")?;
        Ok(client.post(full_url).json(&self.0))
    }
}
