//! # mqtt-anchor ledger
//!
//! The ledger side of the pipeline: a narrow [`LedgerClient`] capability
//! trait, the [`LedgerAdapter`] that owns the one client instance and
//! serializes every call into it, and two clients.
//!
//! ## Key Types
//!
//! - [`LedgerClient`] - Health probe and tagged-block submission
//! - [`LedgerAdapter`] - Owns the client, enforces one ledger call at a time
//! - [`NodeClient`] - HTTP client for a node's core REST API
//! - [`MemoryLedger`] - In-process ledger for tests and dry runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mqtt_anchor_core::bytes_to_hex;
//! use mqtt_anchor_ledger::{ClientOptions, LedgerAdapter};
//!
//! let adapter = LedgerAdapter::init(ClientOptions::new("https://api.testnet.example.net"))
//!     .expect("ledger node unreachable");
//!
//! let block_id = adapter
//!     .submit_tagged_block(&bytes_to_hex(b"SENSOR_DATA"), &bytes_to_hex(b"payload"))
//!     .unwrap();
//! println!("anchored as {}", block_id);
//!
//! adapter.shutdown();
//! ```

pub mod adapter;
pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use adapter::LedgerAdapter;
pub use client::{ClientOptions, LedgerClient, PostedBlock};
pub use error::{ClientError, InitError, SubmitError};
pub use http::NodeClient;
pub use memory::MemoryLedger;
