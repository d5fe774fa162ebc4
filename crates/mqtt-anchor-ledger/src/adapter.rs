//! The ledger adapter: single owner of the ledger client.
//!
//! The client may wrap a runtime that tolerates only one caller at a time,
//! so every health probe and every submission runs inside one critical
//! section. Payload decoding and encoding happen outside the adapter and
//! stay fully parallel; only the ledger call itself is serialized.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use mqtt_anchor_core::BlockId;

use crate::client::{ClientOptions, LedgerClient};
use crate::error::{ClientError, InitError, SubmitError};
use crate::http::NodeClient;

type ClientSlot = Option<Box<dyn LedgerClient>>;

/// Owns the process-wide ledger client for the lifetime of the plugin.
///
/// Share it behind an `Arc`; borrowers can submit blocks but cannot replace
/// the client. [`shutdown`](Self::shutdown) releases it exactly once.
pub struct LedgerAdapter {
    endpoint: String,
    client: Mutex<ClientSlot>,
    lock_timeout: Option<Duration>,
}

impl LedgerAdapter {
    /// Build a [`NodeClient`] for `options.endpoint` and probe the node.
    pub fn init(options: ClientOptions) -> Result<Self, InitError> {
        let endpoint = options.endpoint.clone();
        Self::init_with(&endpoint, || NodeClient::new(&options))
    }

    /// Build a client with `build`, then probe `endpoint` with it.
    ///
    /// A client that cannot be built and a client that cannot reach its
    /// node both fail initialization.
    pub fn init_with<C, F>(endpoint: &str, build: F) -> Result<Self, InitError>
    where
        C: LedgerClient + 'static,
        F: FnOnce() -> Result<C, ClientError>,
    {
        let mut client = build().map_err(InitError::ClientUnavailable)?;

        match client.check_health(endpoint) {
            Ok(true) => {}
            Ok(false) => {
                return Err(InitError::Unhealthy {
                    endpoint: endpoint.to_owned(),
                    reason: "health probe reported unhealthy".into(),
                })
            }
            Err(e) => {
                return Err(InitError::Unhealthy {
                    endpoint: endpoint.to_owned(),
                    reason: e.to_string(),
                })
            }
        }

        info!(endpoint, "ledger client initialized");

        Ok(Self {
            endpoint: endpoint.to_owned(),
            client: Mutex::new(Some(Box::new(client))),
            lock_timeout: None,
        })
    }

    /// Bound how long a caller waits for another ledger call to finish.
    ///
    /// `None` (the default) waits indefinitely.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The node this adapter was initialized against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the client is still held.
    ///
    /// Never waits: while another call holds the client it is reported open.
    pub fn is_open(&self) -> bool {
        match self.client.try_lock() {
            Some(slot) => slot.is_some(),
            None => true,
        }
    }

    /// Probe the configured node again.
    pub fn check_health(&self) -> Result<bool, SubmitError> {
        let mut slot = self.lock()?;
        let client = slot.as_mut().ok_or(SubmitError::Closed)?;
        Ok(client.check_health(&self.endpoint)?)
    }

    /// Post a tagged block and return its identifier.
    ///
    /// `tag` and `data` are `0x`-prefixed hex. Blocks the calling thread
    /// until the client returns.
    pub fn submit_tagged_block(&self, tag: &str, data: &str) -> Result<BlockId, SubmitError> {
        let posted = {
            let mut slot = self.lock()?;
            let client = slot.as_mut().ok_or(SubmitError::Closed)?;
            debug!(tag, data_len = data.len(), "posting tagged block");
            client.post_tagged_block(tag, data).map_err(|e| {
                warn!(error = %e, "ledger client call failed");
                SubmitError::from(e)
            })?
        };

        let raw = posted
            .block_id
            .ok_or_else(|| SubmitError::MalformedResult("result carries no block id".into()))?;
        let block_id =
            BlockId::parse(&raw).map_err(|e| SubmitError::MalformedResult(e.to_string()))?;

        debug!(block_id = %block_id, "tagged block posted");
        Ok(block_id)
    }

    /// Release the client. Calling this again is a no-op.
    pub fn shutdown(&self) {
        if self.client.lock().take().is_some() {
            info!(endpoint = %self.endpoint, "ledger client released");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClientSlot>, SubmitError> {
        match self.lock_timeout {
            None => Ok(self.client.lock()),
            Some(timeout) => self
                .client
                .try_lock_for(timeout)
                .ok_or(SubmitError::Busy(timeout)),
        }
    }
}

impl std::fmt::Debug for LedgerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerAdapter")
            .field("endpoint", &self.endpoint)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PostedBlock;
    use crate::memory::MemoryLedger;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    const ENDPOINT: &str = "memory://node";

    /// Client whose answers are fixed up front.
    struct FixedClient {
        healthy: Result<bool, ClientError>,
        post: Result<PostedBlock, ClientError>,
    }

    impl LedgerClient for FixedClient {
        fn check_health(&mut self, _endpoint: &str) -> Result<bool, ClientError> {
            self.healthy.clone()
        }

        fn post_tagged_block(&mut self, _tag: &str, _data: &str) -> Result<PostedBlock, ClientError> {
            self.post.clone()
        }
    }

    fn adapter_posting(post: Result<PostedBlock, ClientError>) -> LedgerAdapter {
        LedgerAdapter::init_with(ENDPOINT, || {
            Ok(FixedClient {
                healthy: Ok(true),
                post,
            })
        })
        .unwrap()
    }

    #[test]
    fn test_init_probes_endpoint() {
        let adapter = LedgerAdapter::init_with(ENDPOINT, || Ok(MemoryLedger::new())).unwrap();
        assert_eq!(adapter.endpoint(), ENDPOINT);
        assert!(adapter.is_open());
        assert!(adapter.check_health().unwrap());
    }

    #[test]
    fn test_init_client_unavailable() {
        let result = LedgerAdapter::init_with::<MemoryLedger, _>(ENDPOINT, || {
            Err(ClientError::Unavailable("module not installed".into()))
        });
        assert!(matches!(result, Err(InitError::ClientUnavailable(_))));
    }

    #[test]
    fn test_init_unhealthy() {
        let result = LedgerAdapter::init_with(ENDPOINT, || {
            Ok(FixedClient {
                healthy: Ok(false),
                post: Ok(PostedBlock::default()),
            })
        });
        assert!(matches!(result, Err(InitError::Unhealthy { .. })));

        let result = LedgerAdapter::init_with(ENDPOINT, || {
            Ok(FixedClient {
                healthy: Err(ClientError::Transport("connection refused".into())),
                post: Ok(PostedBlock::default()),
            })
        });
        match result {
            Err(InitError::Unhealthy { endpoint, reason }) => {
                assert_eq!(endpoint, ENDPOINT);
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected Unhealthy, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_returns_block_id() {
        let adapter = adapter_posting(Ok(PostedBlock::with_id("0xabc123")));
        let id = adapter.submit_tagged_block("0x00", "0x01").unwrap();
        assert_eq!(id.as_str(), "0xabc123");
    }

    #[test]
    fn test_submit_missing_method() {
        let adapter = adapter_posting(Err(ClientError::Unsupported("no block route".into())));
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::ClientMissingMethod(_))
        ));
    }

    #[test]
    fn test_submit_call_failed() {
        let adapter = adapter_posting(Err(ClientError::Rejected("invalid parents".into())));
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::CallFailed(ClientError::Rejected(_)))
        ));
    }

    #[test]
    fn test_submit_malformed_result() {
        let adapter = adapter_posting(Ok(PostedBlock::default()));
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::MalformedResult(_))
        ));

        let adapter = adapter_posting(Ok(PostedBlock::with_id("abc123")));
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::MalformedResult(_))
        ));

        let oversized = format!("0x{}", "f".repeat(200));
        let adapter = adapter_posting(Ok(PostedBlock::with_id(oversized)));
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let adapter = LedgerAdapter::init_with(ENDPOINT, || Ok(MemoryLedger::new())).unwrap();
        adapter.shutdown();
        adapter.shutdown();
        assert!(!adapter.is_open());
        assert!(matches!(
            adapter.submit_tagged_block("0x00", "0x01"),
            Err(SubmitError::Closed)
        ));
        assert!(matches!(adapter.check_health(), Err(SubmitError::Closed)));
    }

    /// Client that flags any overlapping call.
    struct OverlapProbe {
        in_call: Arc<AtomicBool>,
        overlaps: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl LedgerClient for OverlapProbe {
        fn check_health(&mut self, _endpoint: &str) -> Result<bool, ClientError> {
            Ok(true)
        }

        fn post_tagged_block(&mut self, _tag: &str, _data: &str) -> Result<PostedBlock, ClientError> {
            if self.in_call.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(2));
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.in_call.store(false, Ordering::SeqCst);
            Ok(PostedBlock::with_id(format!("0x{:04x}", n)))
        }
    }

    #[test]
    fn test_submissions_are_serialized() {
        let overlaps = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = OverlapProbe {
            in_call: Arc::new(AtomicBool::new(false)),
            overlaps: Arc::clone(&overlaps),
            calls: Arc::clone(&calls),
        };
        let adapter = LedgerAdapter::init_with(ENDPOINT, || Ok(probe)).unwrap();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..4 {
                        adapter.submit_tagged_block("0x00", "0x01").unwrap();
                    }
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 32);
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    /// Client that parks inside the critical section until released.
    struct ParkingClient {
        entered: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
    }

    impl LedgerClient for ParkingClient {
        fn check_health(&mut self, _endpoint: &str) -> Result<bool, ClientError> {
            Ok(true)
        }

        fn post_tagged_block(&mut self, _tag: &str, _data: &str) -> Result<PostedBlock, ClientError> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            Ok(PostedBlock::with_id("0x01"))
        }
    }

    #[test]
    fn test_lock_timeout_reports_busy() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let client = ParkingClient {
            entered: entered_tx,
            release: release_rx,
        };
        let adapter = LedgerAdapter::init_with(ENDPOINT, || Ok(client))
            .unwrap()
            .with_lock_timeout(Some(Duration::from_millis(20)));

        std::thread::scope(|s| {
            let holder = s.spawn(|| adapter.submit_tagged_block("0x00", "0x01"));
            entered_rx.recv().unwrap();

            assert!(matches!(
                adapter.submit_tagged_block("0x00", "0x02"),
                Err(SubmitError::Busy(_))
            ));

            release_tx.send(()).unwrap();
            assert!(holder.join().unwrap().is_ok());
        });
    }

    #[test]
    fn test_is_open_does_not_wait_for_busy_client() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let client = ParkingClient {
            entered: entered_tx,
            release: release_rx,
        };
        let adapter = LedgerAdapter::init_with(ENDPOINT, || Ok(client))
            .unwrap()
            .with_lock_timeout(Some(Duration::from_millis(20)));

        std::thread::scope(|s| {
            let holder = s.spawn(|| adapter.submit_tagged_block("0x00", "0x01"));
            entered_rx.recv().unwrap();

            // Returns while the submission is still parked.
            assert!(adapter.is_open());

            release_tx.send(()).unwrap();
            assert!(holder.join().unwrap().is_ok());
        });

        adapter.shutdown();
        assert!(!adapter.is_open());
    }
}
