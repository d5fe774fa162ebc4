//! CBOR data model for payload entries.

/// One decoded CBOR data item.
///
/// Every well-formed item the decoder accepts has a variant here, so entries
/// written back by the encoder mean exactly what the sender wrote. Lengths
/// are not kept: nested items are always re-encoded with definite lengths.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Major types 0 and 1, covering `-2^64 ..= 2^64 - 1`.
    Integer(i128),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tag(u64, Box<Value>),
    Float(f64),
    Bool(bool),
    Null,
    Undefined,
    /// Any other simple value (0..=19 or 32..=255).
    Simple(u8),
}

impl Value {
    /// The text, if this is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Integer(i128::from(n))
                }
            }
        )*
    };
}

from_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
