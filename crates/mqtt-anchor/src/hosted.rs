//! Async front end for brokers that run on a tokio runtime.
//!
//! The ledger call blocks its thread, so each enrichment runs on the
//! blocking pool and the async task only awaits the result.

use std::sync::Arc;

use bytes::Bytes;
use mqtt_anchor_core::IngestionTime;

use crate::error::{PipelineError, Rejection};
use crate::pipeline::{Enricher, Stage};

/// Cloneable async handle over a shared [`Enricher`].
#[derive(Debug, Clone)]
pub struct HostedEnricher {
    enricher: Arc<Enricher>,
}

impl HostedEnricher {
    pub fn new(enricher: Arc<Enricher>) -> Self {
        Self { enricher }
    }

    /// Enrich a payload received now.
    pub async fn enrich(&self, payload: Bytes) -> Result<Bytes, Rejection> {
        self.enrich_at(payload, IngestionTime::now()).await
    }

    /// Enrich a payload received at `now`.
    pub async fn enrich_at(&self, payload: Bytes, now: IngestionTime) -> Result<Bytes, Rejection> {
        let enricher = Arc::clone(&self.enricher);
        let joined = tokio::task::spawn_blocking(move || enricher.enrich(&payload, now)).await;

        match joined {
            Ok(result) => result.map(Bytes::from),
            Err(e) => Err(Rejection::new(
                Stage::Received,
                PipelineError::Unknown(format!("enrichment worker failed: {}", e)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Limits;
    use mqtt_anchor_core::decode;
    use mqtt_anchor_ledger::{LedgerAdapter, MemoryLedger};

    fn hosted(ledger: MemoryLedger) -> HostedEnricher {
        let adapter = LedgerAdapter::init_with("memory://node", || Ok(ledger)).unwrap();
        HostedEnricher::new(Arc::new(Enricher::new(Arc::new(adapter), Limits::default())))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_async_enrichment() {
        let ledger = MemoryLedger::new();
        let enricher = hosted(ledger.clone());

        let mut tasks = Vec::new();
        for i in 0..16u8 {
            let enricher = enricher.clone();
            tasks.push(tokio::spawn(async move {
                let payload = Bytes::from(vec![0xbf, 0x61, b'n', 0x18, i + 24, 0xff]);
                enricher.enrich(payload).await
            }));
        }

        for task in tasks {
            let out = task.await.unwrap().unwrap();
            assert_eq!(decode(&out).unwrap().len(), 3);
        }
        assert_eq!(ledger.len(), 16);
    }

    #[tokio::test]
    async fn test_async_rejection() {
        let enricher = hosted(MemoryLedger::new());
        let rejection = enricher
            .enrich_at(Bytes::from_static(&[0x00]), IngestionTime::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(rejection.error, PipelineError::Decode(_)));
    }
}
