//! Proptest generators for property-based testing.

use mqtt_anchor_core::Value;
use proptest::prelude::*;

/// Generate a CBOR scalar.
pub fn cbor_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        Just(Value::Undefined),
        prop_oneof![0u8..20, 32u8..=255].prop_map(Value::Simple),
        // NaN never compares equal, so keep floats finite.
        prop::num::f64::NORMAL.prop_map(Value::Float),
        any::<f32>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| Value::Float(f64::from(f))),
    ]
}

/// Generate a CBOR value up to a few levels deep.
pub fn cbor_value() -> impl Strategy<Value = Value> {
    cbor_scalar().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((".{0,8}".prop_map(Value::Text), inner.clone()), 0..6)
                .prop_map(Value::Map),
            (32u64..1000, inner).prop_map(|(tag, v)| Value::Tag(tag, Box::new(v))),
        ]
    })
}

/// Generate map entries with text keys.
pub fn map_entries(max_len: usize) -> impl Strategy<Value = Vec<(Value, Value)>> {
    prop::collection::vec(("[a-z_]{1,12}".prop_map(Value::Text), cbor_value()), 0..=max_len)
}

/// Generate a valid inbound payload: an indefinite-length map.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    map_entries(max_len).prop_map(crate::fixtures::indefinite_map)
}

/// Generate arbitrary bytes, mostly not valid CBOR.
pub fn junk(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}
