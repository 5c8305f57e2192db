use std::fmt;

use crate::backend::BackendError;
use crate::chain::ChainError;
use crate::model::{BucketId, FileStatus, TxHash};

/// Terminal negative outcome reported by a convergence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Rejected,
    Revoked,
    Expired,
    /// A record we were watching disappeared while it had to exist
    RecordVanished,
    /// The index reported a status that cannot follow the current step
    UnexpectedStatus(FileStatus),
    /// The storage provider advertised no reachable peer ids
    NoProviderPeers,
}

impl FailureReason {
    /// Maps the three terminal failure statuses; `None` for anything else
    pub fn from_status(status: FileStatus) -> Option<Self> {
        match status {
            FileStatus::Rejected => Some(FailureReason::Rejected),
            FileStatus::Revoked => Some(FailureReason::Revoked),
            FileStatus::Expired => Some(FailureReason::Expired),
            FileStatus::Pending | FileStatus::Ready | FileStatus::DeletionInProgress => None,
        }
    }

    /// Short machine-readable code
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Rejected => "rejected",
            FailureReason::Revoked => "revoked",
            FailureReason::Expired => "expired",
            FailureReason::RecordVanished => "record_vanished",
            FailureReason::UnexpectedStatus(_) => "unexpected_status",
            FailureReason::NoProviderPeers => "no_provider_peers",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected => f.write_str("the storage provider rejected the file"),
            FailureReason::Revoked => f.write_str("the storage request was revoked"),
            FailureReason::Expired => {
                f.write_str("the storage request expired before a provider stored the file")
            }
            FailureReason::RecordVanished => {
                f.write_str("the storage request disappeared from the ledger while confirming")
            }
            FailureReason::UnexpectedStatus(status) => {
                write!(f, "unexpected file status '{}'", status)
            }
            FailureReason::NoProviderPeers => {
                f.write_str("the storage provider advertised no peer ids")
            }
        }
    }
}

/// Classified failure of an orchestrated operation.
///
/// Exactly one of these is surfaced per failed call. Partial progress
///  (e.g. a confirmed ledger write whose index never converged) is
///  not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("no wallet identity connected")]
    WalletOrIdentityMissing,
    #[error("transaction rejected by node: {0}")]
    SubmissionRejected(String),
    #[error("transaction {tx_hash} reverted: {message}")]
    ExecutionReverted { tx_hash: TxHash, message: String },
    #[error("session expired, sign in again")]
    AuthExpired,
    #[error("sign-in rejected: {0}")]
    AuthRejected(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("{0}")]
    DefinitivelyFailed(FailureReason),
    #[error("timed out waiting for {operation} after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },
    #[error("{operation} was cancelled")]
    Cancelled { operation: String },
    #[error("transfer failed with status {status}: {message}")]
    TransferFailed { status: u16, message: String },
    #[error("bucket {0} missing on ledger after a successful receipt")]
    VerificationFailed(BucketId),
    #[error("session store error: {0}")]
    SessionStore(String),
    #[error("backend error: {0}")]
    Backend(BackendError),
    #[error("chain error: {0}")]
    Chain(ChainError),
}

impl From<ChainError> for OperationError {
    fn from(e: ChainError) -> Self {
        match e {
            // outcome unknown, keep it apart from transport failures
            ChainError::Timeout {
                operation,
                attempts,
            } => OperationError::Timeout {
                operation,
                attempts,
            },
            other => OperationError::Chain(other),
        }
    }
}

impl OperationError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, OperationError::AuthExpired)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OperationError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_from_status() {
        assert_eq!(
            FailureReason::from_status(FileStatus::Rejected),
            Some(FailureReason::Rejected)
        );
        assert_eq!(
            FailureReason::from_status(FileStatus::Expired),
            Some(FailureReason::Expired)
        );
        assert_eq!(FailureReason::from_status(FileStatus::Ready), None);
        assert_eq!(FailureReason::from_status(FileStatus::Pending), None);
    }

    #[test]
    fn test_chain_timeout_stays_a_timeout() {
        let err = OperationError::from(ChainError::Timeout {
            operation: "transaction receipt".into(),
            attempts: 5,
        });
        assert!(err.is_timeout());

        let err = OperationError::from(ChainError::Transport("connection reset".into()));
        assert!(matches!(err, OperationError::Chain(ChainError::Transport(_))));
    }

    #[test]
    fn test_distinct_user_messages() {
        let reasons = [
            FailureReason::Rejected,
            FailureReason::Revoked,
            FailureReason::Expired,
        ];
        let messages: std::collections::HashSet<_> =
            reasons.iter().map(|r| r.to_string()).collect();
        assert_eq!(messages.len(), reasons.len());
    }
}
