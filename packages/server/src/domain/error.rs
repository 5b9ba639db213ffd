//! Domain errors.

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("shared secret must not be empty")]
    EmptySharedSecret,
}

/// Token store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token was never issued or has already been revoked
    #[error("token not found")]
    NotFound,
}

/// Errors writing a frame to a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("failed to write frame: {0}")]
    WriteFailed(String),

    #[error("timed out writing frame")]
    Timeout,

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("snapshot unavailable: {0}")]
    SnapshotUnavailable(#[from] HubError),
}

/// Connection hub errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub task has exited and no longer accepts commands
    #[error("connection hub is not running")]
    Stopped,
}
