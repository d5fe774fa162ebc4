//! Error types for the ledger adapter.

use thiserror::Error;

/// Errors reported by a [`LedgerClient`](crate::LedgerClient) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The client cannot be built for this endpoint.
    #[error("client unavailable: {0}")]
    Unavailable(String),

    /// The ledger does not expose the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// The ledger rejected the call.
    #[error("call rejected: {0}")]
    Rejected(String),

    /// The call did not reach the ledger or the response was lost.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors that abort adapter construction.
#[derive(Debug, Error)]
pub enum InitError {
    /// The underlying client could not be constructed.
    #[error("ledger client unavailable: {0}")]
    ClientUnavailable(ClientError),

    /// The client was built but the endpoint failed its health probe.
    #[error("ledger endpoint {endpoint} is unhealthy: {reason}")]
    Unhealthy { endpoint: String, reason: String },
}

/// Errors from a single block submission. None of these are fatal.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The client does not expose block submission.
    #[error("ledger client does not support block submission: {0}")]
    ClientMissingMethod(String),

    /// The submission call failed.
    #[error("block submission failed: {0}")]
    CallFailed(ClientError),

    /// The client answered without a usable block identifier.
    #[error("malformed submission result: {0}")]
    MalformedResult(String),

    /// The adapter has been shut down.
    #[error("ledger adapter is shut down")]
    Closed,

    /// Another ledger call held the client past the configured wait.
    #[error("ledger client busy for more than {0:?}")]
    Busy(std::time::Duration),
}

impl From<ClientError> for SubmitError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unsupported(msg) => SubmitError::ClientMissingMethod(msg),
            other => SubmitError::CallFailed(other),
        }
    }
}
