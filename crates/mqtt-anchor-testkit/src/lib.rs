//! # mqtt-anchor testkit
//!
//! Testing utilities for mqtt-anchor.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known payloads with their exact enriched bytes
//! - **Generators**: Proptest strategies for CBOR values and payloads
//! - **Fixtures**: Payload builders and a ready-made ledger adapter
//! - **Scripted ledger**: A [`LedgerClient`](mqtt_anchor_ledger::LedgerClient)
//!   with programmable outcomes that also detects overlapping calls
//!
//! ## Golden Vectors
//!
//! ```rust
//! use mqtt_anchor_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     println!("{}: {} -> {}", vector.name, vector.input_hex, vector.expected_hex);
//! }
//! ```
//!
//! ## Scripted Ledger
//!
//! ```rust
//! use mqtt_anchor_testkit::ledger::{Outcome, ScriptedLedger};
//!
//! let ledger = ScriptedLedger::new();
//! ledger.push(Outcome::BlockId("0xabc123".into()));
//! ledger.push(Outcome::Empty);
//! ```

pub mod fixtures;
pub mod generators;
pub mod ledger;
pub mod vectors;

pub use fixtures::{definite_map, indefinite_map, sensor_entries, sensor_reading, TestFixture};
pub use generators::{cbor_value, map_entries, payload};
pub use ledger::{Call, Outcome, ScriptedLedger};
pub use vectors::{all_vectors, GoldenVector};
