//! The enrichment pipeline.
//!
//! Each message walks the same stages:
//!
//! ```text
//! Received -> Decoded -> TimestampAdded -> Submitted -> TokenAdded -> Encoded -> Delivered
//! ```
//!
//! and any failure ends it as a [`Rejection`] carrying the last stage
//! reached. Enrichment is all-or-nothing: a rejected message never yields a
//! partially enriched payload.
//!
//! The only shared resource is the ledger adapter. Decoding, appending and
//! encoding work on values owned by the calling thread, so concurrent
//! messages only contend on the ledger submission itself.

use std::fmt;
use std::sync::Arc;

use mqtt_anchor_core::{bytes_to_hex, decode, encode_with_limit, IngestionTime};
use mqtt_anchor_ledger::LedgerAdapter;
use tracing::{debug, debug_span};

use crate::error::{PipelineError, Rejection};

/// Literal tag under which payloads are anchored.
pub const SENSOR_TAG: &[u8] = b"SENSOR_DATA";

/// Key of the appended receive timestamp (unsigned, Unix milliseconds).
pub const INGESTION_TIME_KEY: &str = "INGESTION_TIME";

/// Key of the appended ledger block id (text, `0x`-prefixed).
pub const VERIFICATION_TOKEN_KEY: &str = "VERIFICATION_TOKEN";

/// Progress of one message through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Decoded,
    TimestampAdded,
    Submitted,
    TokenAdded,
    Encoded,
    Delivered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::TimestampAdded => "timestamp-added",
            Stage::Submitted => "submitted",
            Stage::TokenAdded => "token-added",
            Stage::Encoded => "encoded",
            Stage::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

/// Size bounds applied to every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest inbound payload accepted.
    pub max_payload_bytes: usize,
    /// Largest enriched payload produced.
    pub max_output_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            max_output_bytes: 128 * 1024,
        }
    }
}

/// Turns raw payloads into enriched payloads.
///
/// Cheap to share: wrap it in an `Arc` and call [`enrich`](Self::enrich)
/// from any number of threads.
#[derive(Debug)]
pub struct Enricher {
    ledger: Arc<LedgerAdapter>,
    limits: Limits,
    tag: String,
}

impl Enricher {
    /// Create an enricher that anchors through `ledger`.
    pub fn new(ledger: Arc<LedgerAdapter>, limits: Limits) -> Self {
        Self {
            ledger,
            limits,
            tag: bytes_to_hex(SENSOR_TAG),
        }
    }

    /// The ledger adapter this enricher borrows.
    pub fn ledger(&self) -> &Arc<LedgerAdapter> {
        &self.ledger
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Enrich one payload received at `now`.
    ///
    /// On success returns a new buffer holding the original entries followed
    /// by `INGESTION_TIME` and `VERIFICATION_TOKEN`. `raw` is never modified.
    /// Exactly one block is submitted per successful call, and none is
    /// retried.
    pub fn enrich(&self, raw: &[u8], now: IngestionTime) -> Result<Vec<u8>, Rejection> {
        let span = debug_span!("enrich", payload_len = raw.len(), ingestion_ms = now.as_millis());
        let _enter = span.enter();

        let mut stage = Stage::Received;
        match self.run(raw, now, &mut stage) {
            Ok(out) => {
                stage = Stage::Delivered;
                debug!(%stage, output_len = out.len(), "message enriched");
                Ok(out)
            }
            Err(error) => Err(Rejection::new(stage, error)),
        }
    }

    fn run(
        &self,
        raw: &[u8],
        now: IngestionTime,
        stage: &mut Stage,
    ) -> Result<Vec<u8>, PipelineError> {
        if raw.len() > self.limits.max_payload_bytes {
            return Err(PipelineError::PayloadTooLarge {
                len: raw.len(),
                limit: self.limits.max_payload_bytes,
            });
        }

        let mut map = decode(raw)?;
        *stage = Stage::Decoded;

        map.append(INGESTION_TIME_KEY, now.as_millis())?;
        *stage = Stage::TimestampAdded;

        let data = bytes_to_hex(raw);
        let block_id = self.ledger.submit_tagged_block(&self.tag, &data)?;
        *stage = Stage::Submitted;
        debug!(block_id = %block_id, entries = map.len(), "payload anchored");

        map.append(VERIFICATION_TOKEN_KEY, block_id.as_str())?;
        *stage = Stage::TokenAdded;

        let out = encode_with_limit(&map, self.limits.max_output_bytes)?;
        *stage = Stage::Encoded;
        Ok(out)
    }
}
