//! Plugin configuration, parsed from the broker's key/value options.

use std::time::Duration;

use mqtt_anchor_ledger::ClientOptions;
use tracing::warn;

use crate::error::ConfigError;
use crate::pipeline::Limits;

/// Recognized option keys.
pub mod keys {
    /// Ledger node URL. Required.
    pub const IOTA_NETWORK_ENDPOINT: &str = "iota_network_endpoint";
    /// Per-request ledger I/O timeout in milliseconds.
    pub const LEDGER_TIMEOUT_MS: &str = "ledger_timeout_ms";
    /// How long a message waits for another ledger call, in milliseconds.
    pub const LEDGER_LOCK_TIMEOUT_MS: &str = "ledger_lock_timeout_ms";
    /// Largest inbound payload accepted.
    pub const MAX_PAYLOAD_BYTES: &str = "max_payload_bytes";
    /// Largest enriched payload produced.
    pub const MAX_OUTPUT_BYTES: &str = "max_output_bytes";
}

/// One `plugin_opt_<key> <value>` line from the broker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOption {
    pub key: String,
    pub value: String,
}

impl PluginOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Ledger node URL.
    pub iota_network_endpoint: Option<String>,
    /// Per-request ledger I/O timeout.
    pub ledger_timeout: Duration,
    /// Wait bound for the ledger critical section; `None` waits forever.
    pub ledger_lock_timeout: Option<Duration>,
    /// Payload size limits.
    pub limits: Limits,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            iota_network_endpoint: None,
            ledger_timeout: mqtt_anchor_ledger::client::DEFAULT_TIMEOUT,
            ledger_lock_timeout: None,
            limits: Limits::default(),
        }
    }
}

impl PluginConfig {
    /// Parse broker options.
    ///
    /// Unrecognized keys are logged and ignored. When a key repeats, the
    /// last value wins.
    pub fn from_options(options: &[PluginOption]) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for option in options {
            let value = option.value.trim();
            match option.key.as_str() {
                keys::IOTA_NETWORK_ENDPOINT => {
                    config.iota_network_endpoint = Some(value.to_owned());
                }
                keys::LEDGER_TIMEOUT_MS => {
                    let ms = parse_positive(keys::LEDGER_TIMEOUT_MS, value)?;
                    config.ledger_timeout = Duration::from_millis(ms);
                }
                keys::LEDGER_LOCK_TIMEOUT_MS => {
                    let ms = parse_positive(keys::LEDGER_LOCK_TIMEOUT_MS, value)?;
                    config.ledger_lock_timeout = Some(Duration::from_millis(ms));
                }
                keys::MAX_PAYLOAD_BYTES => {
                    config.limits.max_payload_bytes =
                        parse_positive(keys::MAX_PAYLOAD_BYTES, value)? as usize;
                }
                keys::MAX_OUTPUT_BYTES => {
                    config.limits.max_output_bytes =
                        parse_positive(keys::MAX_OUTPUT_BYTES, value)? as usize;
                }
                other => {
                    warn!(key = other, "unexpected configuration key, ignoring it");
                }
            }
        }

        Ok(config)
    }

    /// The ledger endpoint, which must be present and non-empty.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        match self.iota_network_endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => Ok(endpoint),
            _ => Err(ConfigError::MissingOption(keys::IOTA_NETWORK_ENDPOINT)),
        }
    }

    /// Options for building the ledger client.
    pub fn client_options(&self) -> Result<ClientOptions, ConfigError> {
        Ok(ClientOptions::new(self.endpoint()?).with_timeout(self.ledger_timeout))
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    let n: u64 = value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(&e.to_string()))?;
    if n == 0 {
        return Err(invalid("must be greater than zero"));
    }
    if usize::try_from(n).is_err() {
        return Err(invalid("too large for this platform"));
    }
    Ok(n)
}
