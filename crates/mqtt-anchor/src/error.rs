//! Error types for the pipeline and the plugin lifecycle.

use mqtt_anchor_core::{DecodeError, EncodeError};
use mqtt_anchor_ledger::{InitError, SubmitError};
use thiserror::Error;

use crate::pipeline::Stage;

/// Why a message could not be enriched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The payload is not an indefinite-length CBOR map.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The enriched map could not be built or serialized.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The ledger did not produce a block id.
    #[error("ledger error: {0}")]
    Submit(#[from] SubmitError),

    /// The inbound payload is larger than the configured limit.
    #[error("payload of {len} bytes exceeds limit of {limit}")]
    PayloadTooLarge { len: usize, limit: usize },

    /// Anything else, e.g. a worker that panicked.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// A message that left the pipeline without being enriched.
///
/// `stage` is the last stage the message reached before failing.
#[derive(Debug, Error)]
#[error("message rejected after stage {stage}: {error}")]
pub struct Rejection {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl Rejection {
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        Self { stage, error }
    }
}

/// Configuration errors, all fatal to plugin load.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `iota_network_endpoint` was not supplied.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// A recognized option has a value that cannot be used.
    #[error("invalid value {value:?} for option {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors that prevent the plugin from activating.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("ledger initialization failed: {0}")]
    Init(#[from] InitError),
}

/// Result type for plugin lifecycle operations.
pub type Result<T> = std::result::Result<T, PluginError>;
