use std::fmt;
use std::time::Duration;

use crate::marker::MarkerId;
use crate::policy::Retryable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store has no record under this id.
    NotFound(MarkerId),
    /// Connection failure or the store is unreachable.
    Transport(String),
    /// Unexpected HTTP status.
    Status(u16),
    /// Response body could not be decoded.
    Decode(String),
    /// No answer within the policy timeout.
    Timeout(Duration),
    LockPoisoned(&'static str),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotFound(id) => write!(f, "remote record not found: {}", id),
            RemoteError::Transport(msg) => write!(f, "remote transport error: {}", msg),
            RemoteError::Status(code) => write!(f, "remote store answered with status {}", code),
            RemoteError::Decode(msg) => write!(f, "remote response decode error: {}", msg),
            RemoteError::Timeout(after) => write!(f, "remote call timed out after {:?}", after),
            RemoteError::LockPoisoned(operation) => {
                write!(f, "remote store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for RemoteError {}

impl Retryable for RemoteError {
    fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport(_) | RemoteError::Timeout(_) => true,
            RemoteError::Status(code) => *code >= 500,
            _ => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        RemoteError::Timeout(after)
    }
}
