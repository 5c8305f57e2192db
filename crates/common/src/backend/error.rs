/// Errors raised by the indexing backend and the storage-provider
///  transfer endpoints
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// HTTP 401, or a token the backend no longer honours
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The backend explicitly reported that no session exists
    #[error("no active session")]
    NoSession,
    /// Record not indexed yet, or already removed
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }

    /// Whether this error means the session is no longer valid
    pub fn is_auth(&self) -> bool {
        match self {
            BackendError::Unauthorized(_) | BackendError::NoSession => true,
            BackendError::Status { status, .. } => *status == 401,
            BackendError::NotFound(_)
            | BackendError::Unavailable(_)
            | BackendError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_classification() {
        assert!(BackendError::Unauthorized("expired".into()).is_auth());
        assert!(BackendError::NoSession.is_auth());
        assert!(BackendError::Status {
            status: 401,
            message: String::new()
        }
        .is_auth());
        assert!(!BackendError::Status {
            status: 403,
            message: String::new()
        }
        .is_auth());
        assert!(!BackendError::NotFound("file".into()).is_auth());
        assert!(!BackendError::Unavailable("down".into()).is_auth());
    }
}
