use reqwest::StatusCode;

use common::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    /// 401 on a request sent without a bearer token
    #[error("no session: {0}")]
    NoSession(String),
}

impl From<ApiError> for BackendError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::HttpStatus(status, message) => match status {
                StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
                StatusCode::NOT_FOUND => BackendError::NotFound(message),
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => BackendError::Unavailable(message),
                other => BackendError::Status {
                    status: other.as_u16(),
                    message,
                },
            },
            ApiError::NoSession(_) => BackendError::NoSession,
            ApiError::Reqwest(e) if e.is_decode() => BackendError::Decode(e.to_string()),
            ApiError::Reqwest(e) => BackendError::Unavailable(e.to_string()),
            ApiError::UrlParse(e) => BackendError::Decode(format!("invalid url: {}", e)),
        }
    }
}
