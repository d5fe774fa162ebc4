//! Plugin lifecycle: version negotiation, init, message callback, cleanup.
//!
//! The broker's ABI glue stays thin: it translates its option array into
//! [`PluginOption`]s, calls [`Plugin::init`] once, forwards every published
//! message to [`Plugin::on_message`], and drops the plugin on unload.

use std::sync::Arc;

use bytes::Bytes;
use mqtt_anchor_core::IngestionTime;
use mqtt_anchor_ledger::{ClientError, ClientOptions, LedgerAdapter, LedgerClient, NodeClient};
use tracing::{error, info};

use crate::config::{PluginConfig, PluginOption};
use crate::error::Result;
use crate::pipeline::Enricher;
use crate::status::BrokerStatus;

/// Plugin API version this extension implements.
pub const PLUGIN_API_VERSION: i32 = 5;

/// Pick the plugin API version from those the broker offers.
pub fn negotiate_version(supported: &[i32]) -> Option<i32> {
    supported
        .iter()
        .copied()
        .find(|&v| v == PLUGIN_API_VERSION)
}

/// A published message as handed over by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub topic: String,
    pub payload: Bytes,
}

impl MessageEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// The loaded extension.
///
/// Owns the one ledger adapter for its whole lifetime; dropping the plugin
/// releases the ledger client.
pub struct Plugin {
    config: PluginConfig,
    enricher: Arc<Enricher>,
}

impl Plugin {
    /// Parse options, connect to the configured node and probe it.
    ///
    /// Any failure here means the broker must not activate the extension.
    pub fn init(options: &[PluginOption]) -> Result<Self> {
        Self::init_with_client(options, NodeClient::new)
    }

    /// Like [`init`](Self::init), with a caller-supplied ledger client.
    pub fn init_with_client<C, F>(options: &[PluginOption], build: F) -> Result<Self>
    where
        C: LedgerClient + 'static,
        F: FnOnce(&ClientOptions) -> std::result::Result<C, ClientError>,
    {
        let config = PluginConfig::from_options(options)?;
        let client_options = config.client_options()?;

        let adapter = LedgerAdapter::init_with(&client_options.endpoint, || build(&client_options))
            .map_err(|e| {
                error!(error = %e, "failed to initialize ledger");
                e
            })?
            .with_lock_timeout(config.ledger_lock_timeout);

        info!(
            endpoint = %client_options.endpoint,
            max_payload_bytes = config.limits.max_payload_bytes,
            "provenance plugin initialized"
        );

        let enricher = Arc::new(Enricher::new(Arc::new(adapter), config.limits));
        Ok(Self { config, enricher })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Shared handle to the pipeline, e.g. for [`HostedEnricher`](crate::HostedEnricher).
    pub fn enricher(&self) -> Arc<Enricher> {
        Arc::clone(&self.enricher)
    }

    /// Message callback: enrich the payload received now.
    pub fn on_message(&self, event: &mut MessageEvent) -> BrokerStatus {
        self.on_message_at(event, IngestionTime::now())
    }

    /// Message callback with an explicit receive time.
    ///
    /// On success the event's payload is replaced and the old buffer is
    /// released to the broker. On failure the event is left as it was.
    pub fn on_message_at(&self, event: &mut MessageEvent, now: IngestionTime) -> BrokerStatus {
        match self.enricher.enrich(&event.payload, now) {
            Ok(enriched) => {
                event.payload = Bytes::from(enriched);
                BrokerStatus::Success
            }
            Err(rejection) => {
                let status = BrokerStatus::from(&rejection);
                error!(
                    topic = %event.topic,
                    stage = %rejection.stage,
                    error = %rejection.error,
                    status = status.code(),
                    "failed to enrich message"
                );
                status
            }
        }
    }

    /// Unload: release the ledger client.
    pub fn cleanup(self) {
        drop(self);
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        self.enricher.ledger().shutdown();
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
