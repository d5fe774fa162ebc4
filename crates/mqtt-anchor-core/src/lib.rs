//! # mqtt-anchor core
//!
//! Pure primitives for the enrichment pipeline: the `0x` hex codec, the
//! indefinite-length CBOR map codec, and the identifiers that flow between
//! the broker and the ledger.
//!
//! This crate contains no I/O, no locking, no networking. Every call owns its
//! inputs and outputs, so everything here is safe to run in parallel from any
//! number of broker threads.
//!
//! ## Key Types
//!
//! - [`TaggedMap`] - Ordered entries decoded from an indefinite-length CBOR map
//! - [`Value`] - One CBOR data item, simple values included
//! - [`BlockId`] - Bounded, `0x`-prefixed ledger block identifier
//! - [`IngestionTime`] - Wall-clock receive time in Unix milliseconds
//!
//! ## Wire Format
//!
//! Payloads are CBOR maps framed with an open-ended entry count
//! (`0xbf ... 0xff`). See the [`codec`] module.

pub mod codec;
pub mod error;
pub mod hex;
pub mod types;
pub mod value;

pub use codec::{decode, encode, encode_value, encode_with_limit, TaggedMap};
pub use error::{BlockIdError, DecodeError, EncodeError};
pub use hex::{bytes_to_hex, hex_to_bytes};
pub use types::{
    timestamp_to_iso8601, timestamp_to_iso8601_in, BlockId, IngestionTime, MAX_BLOCK_ID_LEN,
};
pub use value::Value;
