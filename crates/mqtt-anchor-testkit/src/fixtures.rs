//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use mqtt_anchor_core::{encode, encode_value, TaggedMap, Value};
use mqtt_anchor_ledger::LedgerAdapter;

use crate::ledger::ScriptedLedger;

/// Endpoint the fixture adapter is bound to.
pub const FIXTURE_ENDPOINT: &str = "memory://testkit";

/// A scripted ledger plus an adapter that owns a clone of it.
pub struct TestFixture {
    pub ledger: ScriptedLedger,
    pub adapter: Arc<LedgerAdapter>,
}

impl TestFixture {
    /// Create a fixture over a fresh, healthy scripted ledger.
    pub fn new() -> Self {
        Self::with_ledger(ScriptedLedger::new())
    }

    /// Create a fixture over `ledger`. The fixture keeps a handle for
    /// inspecting calls after the adapter has used it.
    pub fn with_ledger(ledger: ScriptedLedger) -> Self {
        let client = ledger.clone();
        let adapter = LedgerAdapter::init_with(FIXTURE_ENDPOINT, move || Ok(client))
            .expect("scripted ledger must initialize");
        Self {
            ledger,
            adapter: Arc::new(adapter),
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `entries` as an indefinite-length map, the only accepted shape.
pub fn indefinite_map(entries: Vec<(Value, Value)>) -> Vec<u8> {
    encode(&TaggedMap::from(entries)).expect("fixture map must encode")
}

/// Encode `entries` as a definite-length map (rejected by the decoder).
pub fn definite_map(entries: Vec<(Value, Value)>) -> Vec<u8> {
    encode_value(&Value::Map(entries)).expect("fixture map must encode")
}

/// Entries of a typical sensor reading.
pub fn sensor_entries() -> Vec<(Value, Value)> {
    vec![
        (Value::Text("sensor".into()), Value::Text("temp-01".into())),
        (Value::Text("value".into()), Value::Float(21.5)),
        (Value::Text("unit".into()), Value::Text("C".into())),
        (Value::Text("seq".into()), Value::Integer(42)),
    ]
}

/// A typical sensor reading as it arrives from a device.
pub fn sensor_reading() -> Vec<u8> {
    indefinite_map(sensor_entries())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_framing() {
        let open = indefinite_map(sensor_entries());
        assert_eq!(open.first(), Some(&0xbf));
        assert_eq!(open.last(), Some(&0xff));

        let closed = definite_map(sensor_entries());
        assert_eq!(closed.first(), Some(&0xa4));
    }

    #[test]
    fn test_fixture_adapter_is_open() {
        let fixture = TestFixture::new();
        assert!(fixture.adapter.is_open());
        assert_eq!(fixture.adapter.endpoint(), FIXTURE_ENDPOINT);
        assert_eq!(fixture.ledger.health_probes(), 1);
    }
}
