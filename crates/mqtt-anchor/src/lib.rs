//! # mqtt-anchor
//!
//! A broker extension that stamps every published CBOR map payload with a
//! provenance record and anchors the original payload on a ledger.
//!
//! ## Overview
//!
//! For each message the pipeline:
//!
//! 1. decodes the payload, which must be an indefinite-length CBOR map;
//! 2. appends `INGESTION_TIME` (Unix milliseconds);
//! 3. posts a tagged block (`tag = hex("SENSOR_DATA")`, `data = hex(payload)`);
//! 4. appends `VERIFICATION_TOKEN` (the block id);
//! 5. re-encodes the map and hands the new buffer to the broker.
//!
//! Failures at any step reject the message; nothing partial is published.
//!
//! ## Concurrency
//!
//! Brokers may call into the plugin from several threads at once. Codec
//! work runs in parallel; ledger calls are serialized by the
//! [`LedgerAdapter`](mqtt_anchor_ledger::LedgerAdapter).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mqtt_anchor::{MessageEvent, Plugin, PluginOption};
//!
//! let plugin = Plugin::init(&[PluginOption::new(
//!     "iota_network_endpoint",
//!     "https://api.testnet.example.net",
//! )])
//! .expect("plugin failed to load");
//!
//! let mut event = MessageEvent::new("sensors/kitchen", vec![0xbf, 0xff]);
//! let status = plugin.on_message(&mut event);
//! println!("broker status {}", status.code());
//!
//! plugin.cleanup();
//! ```
//!
//! ## Re-exports
//!
//! - `mqtt_anchor::core` - Codecs and identifiers
//! - `mqtt_anchor::ledger` - Ledger client trait, adapter and clients

pub mod config;
pub mod error;
pub mod hosted;
pub mod pipeline;
pub mod plugin;
pub mod status;

// Re-export component crates
pub use mqtt_anchor_core as core;
pub use mqtt_anchor_ledger as ledger;

pub use config::{PluginConfig, PluginOption};
pub use error::{ConfigError, PipelineError, PluginError, Rejection, Result};
pub use hosted::HostedEnricher;
pub use pipeline::{
    Enricher, Limits, Stage, INGESTION_TIME_KEY, SENSOR_TAG, VERIFICATION_TOKEN_KEY,
};
pub use plugin::{negotiate_version, MessageEvent, Plugin, PLUGIN_API_VERSION};
pub use status::BrokerStatus;
