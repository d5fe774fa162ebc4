//! The ledger capability interface.
//!
//! A ledger client knows how to probe a node and how to build and post a
//! block carrying a tag and a data field. Everything else (retries, proof of
//! work, parent selection) is the client's own business.

use std::time::Duration;

use crate::error::ClientError;

/// Proof of work is always done by the client, never delegated to the node.
const LOCAL_POW: bool = true;

/// Default I/O timeout for a single ledger request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options used to build a client bound to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Node URL, e.g. `https://api.testnet.example.net`.
    pub endpoint: String,
    /// Connect/read/write timeout per request.
    pub timeout: Duration,
    local_pow: bool,
}

impl ClientOptions {
    /// Options for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            local_pow: LOCAL_POW,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the client computes proof of work itself. Fixed to `true`.
    pub fn local_pow(&self) -> bool {
        self.local_pow
    }
}

/// What a client reports after posting a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedBlock {
    /// The produced block's identifier, if the ledger returned one.
    pub block_id: Option<String>,
}

impl PostedBlock {
    /// A result carrying a block identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            block_id: Some(id.into()),
        }
    }
}

/// Capability interface over a ledger network client.
///
/// Implementations need not be thread-safe beyond `Send`: the adapter holds
/// the only instance behind a mutex and calls it from one thread at a time.
pub trait LedgerClient: Send {
    /// Probe a node. `Ok(false)` means reachable but not healthy.
    fn check_health(&mut self, endpoint: &str) -> Result<bool, ClientError>;

    /// Build a tagged-data block from hex `tag` and hex `data` and post it.
    fn post_tagged_block(&mut self, tag: &str, data: &str) -> Result<PostedBlock, ClientError>;
}

impl<C: LedgerClient + ?Sized> LedgerClient for Box<C> {
    fn check_health(&mut self, endpoint: &str) -> Result<bool, ClientError> {
        (**self).check_health(endpoint)
    }

    fn post_tagged_block(&mut self, tag: &str, data: &str) -> Result<PostedBlock, ClientError> {
        (**self).post_tagged_block(tag, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_pow_is_fixed() {
        let options = ClientOptions::new("http://localhost:14265").with_timeout(Duration::from_secs(1));
        assert!(options.local_pow());
        assert_eq!(options.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_client_error_mapping() {
        use crate::error::SubmitError;

        let missing: SubmitError = ClientError::Unsupported("no block route".into()).into();
        assert!(matches!(missing, SubmitError::ClientMissingMethod(_)));

        let failed: SubmitError = ClientError::Transport("reset".into()).into();
        assert!(matches!(failed, SubmitError::CallFailed(ClientError::Transport(_))));
    }
}
