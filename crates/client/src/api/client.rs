use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

use common::backend::SessionProvider;

use super::error::ApiError;
use super::ApiRequest;

/// JSON client for the backend's REST API.
///
/// Credentials are read from the session provider right before each
///  request is dispatched, so invalidating the session takes effect
///  on the very next call.
#[derive(Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
    sessions: Option<Arc<dyn SessionProvider>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("remote", &self.remote.as_str())
            .field("authenticated", &self.sessions.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
            sessions: None,
        })
    }

    /// Attach a bearer token from `sessions` to every request
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionProvider>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T::Response>().await?)
    }

    /// Dispatch `request` and return the raw response, which is only
    ///  handed back on a success status
    pub async fn send<T: ApiRequest>(&self, request: T) -> Result<Response, ApiError> {
        let builder = request.build_request(&self.remote, &self.client)?;
        let (builder, authorized) = self.authorize(builder);
        let response = builder.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::UNAUTHORIZED && self.sessions.is_some() && !authorized {
            // a session-backed client with nothing to send
            Err(ApiError::NoSession(response.text().await?))
        } else {
            Err(ApiError::HttpStatus(status, response.text().await?))
        }
    }

    /// Dispatch a hand-built request without checking its status
    pub async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let (builder, _) = self.authorize(builder);
        Ok(builder.send().await?)
    }

    /// Attach the current bearer token, if any, and report whether one was sent
    fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, bool) {
        match self.sessions.as_ref().and_then(|s| s.credentials()) {
            Some(credentials) => (builder.bearer_auth(credentials.token), true),
            None => (builder, false),
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
