//! Error types for the core codecs.

use thiserror::Error;

/// Errors produced while decoding an inbound payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is not a single well-formed CBOR item.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The buffer parsed, but the top-level item is not an indefinite-length map.
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(&'static str),
}

/// Errors produced while mutating or serializing a map.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// An entry could not be appended because allocation failed.
    #[error("out of memory while appending entry")]
    OutOfMemory,

    /// The output buffer could not be produced.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// The encoded map would not fit the destination buffer.
    #[error("encoded size {size} exceeds limit {limit}")]
    ExceedsLimit { size: usize, limit: usize },
}

/// Errors produced while validating a ledger block identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockIdError {
    #[error("block id is missing the 0x prefix")]
    MissingPrefix,

    #[error("block id is {0} bytes, longer than the allowed maximum")]
    TooLong(usize),

    #[error("block id has no content after the prefix")]
    Empty,

    #[error("block id contains a non-printable character at byte {0}")]
    NotPrintable(usize),
}
