//! In-process ledger.
//!
//! Keeps posted blocks in memory and derives each block id as the Blake3
//! hash of the block contents and its position. Useful for tests and for
//! running a broker without a node.

use std::sync::Arc;

use parking_lot::Mutex;

use mqtt_anchor_core::{bytes_to_hex, hex_to_bytes};

use crate::client::{LedgerClient, PostedBlock};
use crate::error::ClientError;

/// Tagged-data tags longer than this are rejected, as a node would.
pub const MAX_TAG_LEN: usize = 64;

/// A block accepted by the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlock {
    pub id: String,
    pub tag: Vec<u8>,
    pub data: Vec<u8>,
}

/// In-memory ledger client.
///
/// Clones share the same block list, so a test can keep one handle while
/// the adapter owns another.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    blocks: Arc<Mutex<Vec<StoredBlock>>>,
    healthy: bool,
}

impl MemoryLedger {
    /// Create an empty, healthy ledger.
    pub fn new() -> Self {
        Self {
            blocks: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }

    /// Create a ledger whose health probe always fails.
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Snapshot of all posted blocks, in posting order.
    pub fn blocks(&self) -> Vec<StoredBlock> {
        self.blocks.lock().clone()
    }

    /// Number of posted blocks.
    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Whether nothing has been posted.
    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerClient for MemoryLedger {
    fn check_health(&mut self, _endpoint: &str) -> Result<bool, ClientError> {
        Ok(self.healthy)
    }

    fn post_tagged_block(&mut self, tag: &str, data: &str) -> Result<PostedBlock, ClientError> {
        let tag = hex_to_bytes(tag).map_err(|e| ClientError::Rejected(format!("tag: {}", e)))?;
        let data = hex_to_bytes(data).map_err(|e| ClientError::Rejected(format!("data: {}", e)))?;
        if tag.len() > MAX_TAG_LEN {
            return Err(ClientError::Rejected(format!(
                "tag is {} bytes, maximum is {}",
                tag.len(),
                MAX_TAG_LEN
            )));
        }

        let mut blocks = self.blocks.lock();
        let seq = blocks.len() as u64;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&seq.to_be_bytes());
        hasher.update(&(tag.len() as u64).to_be_bytes());
        hasher.update(&tag);
        hasher.update(&data);
        let id = bytes_to_hex(hasher.finalize().as_bytes());

        blocks.push(StoredBlock {
            id: id.clone(),
            tag,
            data,
        });
        Ok(PostedBlock::with_id(id))
    }
}
