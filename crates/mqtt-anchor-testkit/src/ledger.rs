//! Scripted ledger client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use mqtt_anchor_ledger::{ClientError, LedgerClient, PostedBlock};

/// What the next submission returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Succeed with this block id.
    BlockId(String),
    /// Succeed without any block id.
    Empty,
    /// Fail with this error.
    Error(ClientError),
}

/// One submission seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub tag: String,
    pub data: String,
}

#[derive(Debug)]
struct Shared {
    script: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<Call>>,
    in_call: AtomicBool,
    overlaps: AtomicUsize,
    health_probes: AtomicUsize,
}

/// Ledger client that plays back queued outcomes.
///
/// When the queue is empty, submissions succeed with a block id derived
/// from the call number. Clones share all state.
#[derive(Debug, Clone)]
pub struct ScriptedLedger {
    shared: Arc<Shared>,
    healthy: bool,
    delay: Duration,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                script: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                in_call: AtomicBool::new(false),
                overlaps: AtomicUsize::new(0),
                health_probes: AtomicUsize::new(0),
            }),
            healthy: true,
            delay: Duration::ZERO,
        }
    }

    /// Report unhealthy on every probe.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Hold each submission for `delay`, widening the window for overlaps.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue the outcome of a future submission.
    pub fn push(&self, outcome: Outcome) {
        self.shared.script.lock().push_back(outcome);
    }

    /// Submissions seen so far.
    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.shared.calls.lock().len()
    }

    /// Number of submissions that started while another was in progress.
    pub fn overlaps(&self) -> usize {
        self.shared.overlaps.load(Ordering::SeqCst)
    }

    pub fn health_probes(&self) -> usize {
        self.shared.health_probes.load(Ordering::SeqCst)
    }

    /// Block id handed out for the `n`th unscripted call.
    pub fn default_block_id(n: usize) -> String {
        format!("0x{:064x}", n)
    }
}

impl Default for ScriptedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerClient for ScriptedLedger {
    fn check_health(&mut self, _endpoint: &str) -> Result<bool, ClientError> {
        self.shared.health_probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.healthy)
    }

    fn post_tagged_block(&mut self, tag: &str, data: &str) -> Result<PostedBlock, ClientError> {
        if self.shared.in_call.swap(true, Ordering::SeqCst) {
            self.shared.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let n = {
            let mut calls = self.shared.calls.lock();
            calls.push(Call {
                tag: tag.to_owned(),
                data: data.to_owned(),
            });
            calls.len() - 1
        };
        let outcome = self.shared.script.lock().pop_front();

        self.shared.in_call.store(false, Ordering::SeqCst);

        match outcome {
            Some(Outcome::BlockId(id)) => Ok(PostedBlock::with_id(id)),
            Some(Outcome::Empty) => Ok(PostedBlock::default()),
            Some(Outcome::Error(e)) => Err(e),
            None => Ok(PostedBlock::with_id(Self::default_block_id(n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_plays_in_order() {
        let mut ledger = ScriptedLedger::new();
        ledger.push(Outcome::BlockId("0xabc".into()));
        ledger.push(Outcome::Error(ClientError::Rejected("nope".into())));
        ledger.push(Outcome::Empty);

        assert_eq!(
            ledger.post_tagged_block("0x01", "0x02").unwrap().block_id.as_deref(),
            Some("0xabc")
        );
        assert!(ledger.post_tagged_block("0x01", "0x02").is_err());
        assert_eq!(ledger.post_tagged_block("0x01", "0x02").unwrap().block_id, None);

        // Script exhausted: default ids keyed by call number.
        assert_eq!(
            ledger.post_tagged_block("0x01", "0x02").unwrap().block_id,
            Some(ScriptedLedger::default_block_id(3))
        );
        assert_eq!(ledger.call_count(), 4);
        assert_eq!(ledger.overlaps(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let ledger = ScriptedLedger::new();
        let mut client = ledger.clone();
        client.check_health("memory://").unwrap();
        client.post_tagged_block("0x01", "0x02").unwrap();

        assert_eq!(ledger.health_probes(), 1);
        assert_eq!(
            ledger.calls(),
            vec![Call {
                tag: "0x01".into(),
                data: "0x02".into()
            }]
        );
    }

    #[test]
    fn test_unhealthy() {
        let mut ledger = ScriptedLedger::new().unhealthy();
        assert!(!ledger.check_health("memory://").unwrap());
    }
}
