//! CBOR codec for sensor payloads.
//!
//! Inbound payloads must be a single CBOR map framed with an open-ended
//! entry count:
//!
//! ```text
//! 0xbf  key value  key value  ...  0xff
//! ```
//!
//! A map with a declared entry count (`0xa0..=0xbb`) carries the same
//! logical content but is rejected: upstream producers always stream their
//! maps, and anything else is treated as foreign traffic.
//!
//! Decoding walks item headers with `ciborium-ll` into [`Value`], which
//! keeps every simple value (including `undefined` and unassigned ones) so
//! existing entries survive the round trip. Encoding is done here so the
//! outer framing, the entry order and the head widths are under our control:
//! - Outer map keeps the indefinite framing
//! - Entries are written in order, never sorted
//! - Nested items use definite lengths and the shortest head
//! - Floats use single precision when that is lossless

use ciborium_ll::{simple, Decoder, Header};

use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

/// Initial byte of an indefinite-length map.
const INDEFINITE_MAP: u8 = 0xbf;

/// Stop code terminating an indefinite-length item.
const BREAK: u8 = 0xff;

/// Deepest nesting accepted from a sender.
pub const MAX_DEPTH: usize = 128;

/// Chunk size for reading byte and text strings.
const SCRATCH_LEN: usize = 4096;

/// Major types used by the encoder.
mod major {
    pub const UNSIGNED: u8 = 0;
    pub const NEGATIVE: u8 = 1;
    pub const BYTES: u8 = 2;
    pub const TEXT: u8 = 3;
    pub const ARRAY: u8 = 4;
    pub const MAP: u8 = 5;
    pub const TAG: u8 = 6;
}

/// An ordered list of map entries decoded from one payload.
///
/// Keys are not required to be unique; entries keep decode order and new
/// entries only ever go at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedMap {
    entries: Vec<(Value, Value)>,
}

impl TaggedMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry after all existing ones.
    pub fn append(
        &mut self,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<(), EncodeError> {
        self.entries
            .try_reserve(1)
            .map_err(|_| EncodeError::OutOfMemory)?;
        self.entries.push((key.into(), value.into()));
        Ok(())
    }

    /// All entries, in order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Consume the map, yielding its entries.
    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last value stored under a text key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| matches!(k, Value::Text(t) if t == key))
            .map(|(_, v)| v)
    }
}

impl From<Vec<(Value, Value)>> for TaggedMap {
    fn from(entries: Vec<(Value, Value)>) -> Self {
        Self { entries }
    }
}

/// Decode an untrusted payload into a [`TaggedMap`].
///
/// The whole buffer must be exactly one CBOR item, and that item must be an
/// indefinite-length map. Declared lengths are never used to pre-allocate.
pub fn decode(buf: &[u8]) -> Result<TaggedMap, DecodeError> {
    let Some(&initial) = buf.first() else {
        return Err(DecodeError::Malformed("empty buffer".into()));
    };

    let mut decoder = Decoder::from(buf);
    let value = read_value(&mut decoder, 0)?;

    let consumed = decoder.offset();
    if consumed != buf.len() {
        return Err(DecodeError::Malformed(format!(
            "{} trailing bytes after top-level item",
            buf.len() - consumed
        )));
    }

    match value {
        Value::Map(entries) if initial == INDEFINITE_MAP => Ok(TaggedMap { entries }),
        Value::Map(_) => Err(DecodeError::UnexpectedShape(
            "map declares a fixed entry count",
        )),
        _ => Err(DecodeError::UnexpectedShape("top-level item is not a map")),
    }
}

/// Read one complete item.
fn read_value(decoder: &mut Decoder<&[u8]>, depth: usize) -> Result<Value, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::Malformed(format!(
            "nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }

    let offset = decoder.offset();
    let value = match decoder.pull().map_err(malformed)? {
        Header::Positive(n) => Value::Integer(i128::from(n)),
        Header::Negative(n) => Value::Integer(-1 - i128::from(n)),
        Header::Float(f) => Value::Float(f),
        Header::Simple(n) => {
            // One-byte form carries 0..=23, two-byte form only 32..=255.
            let two_byte = decoder.offset() - offset == 2;
            if two_byte != (n >= 24) || (24..32).contains(&n) {
                return Err(DecodeError::Malformed(format!(
                    "invalid simple value encoding at byte {}",
                    offset
                )));
            }
            match n {
                simple::FALSE => Value::Bool(false),
                simple::TRUE => Value::Bool(true),
                simple::NULL => Value::Null,
                simple::UNDEFINED => Value::Undefined,
                n => Value::Simple(n),
            }
        }
        Header::Tag(tag) => Value::Tag(tag, Box::new(read_value(decoder, depth + 1)?)),
        Header::Break => {
            return Err(DecodeError::Malformed(format!(
                "unexpected break at byte {}",
                offset
            )))
        }
        Header::Bytes(len) => Value::Bytes(read_bytes(decoder, len)?),
        Header::Text(len) => Value::Text(read_text(decoder, len)?),
        Header::Array(len) => {
            let mut items = Vec::new();
            match len {
                Some(n) => {
                    for _ in 0..n {
                        items.push(read_value(decoder, depth + 1)?);
                    }
                }
                None => {
                    while !at_break(decoder)? {
                        items.push(read_value(decoder, depth + 1)?);
                    }
                }
            }
            Value::Array(items)
        }
        Header::Map(len) => {
            let mut entries = Vec::new();
            match len {
                Some(n) => {
                    for _ in 0..n {
                        let key = read_value(decoder, depth + 1)?;
                        let value = read_value(decoder, depth + 1)?;
                        entries.push((key, value));
                    }
                }
                None => {
                    while !at_break(decoder)? {
                        let key = read_value(decoder, depth + 1)?;
                        let value = read_value(decoder, depth + 1)?;
                        entries.push((key, value));
                    }
                }
            }
            Value::Map(entries)
        }
    };
    Ok(value)
}

/// Consume a break if one is next; otherwise leave the header in place.
fn at_break(decoder: &mut Decoder<&[u8]>) -> Result<bool, DecodeError> {
    match decoder.pull().map_err(malformed)? {
        Header::Break => Ok(true),
        header => {
            decoder.push(header);
            Ok(false)
        }
    }
}

fn read_bytes(decoder: &mut Decoder<&[u8]>, len: Option<usize>) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    let mut scratch = [0u8; SCRATCH_LEN];
    let mut segments = decoder.bytes(len);
    while let Some(mut segment) = segments.pull().map_err(malformed)? {
        while let Some(chunk) = segment.pull(&mut scratch).map_err(malformed)? {
            out.extend_from_slice(chunk);
        }
    }
    Ok(out)
}

fn read_text(decoder: &mut Decoder<&[u8]>, len: Option<usize>) -> Result<String, DecodeError> {
    let mut out = String::new();
    let mut scratch = [0u8; SCRATCH_LEN];
    let mut segments = decoder.text(len);
    while let Some(mut segment) = segments.pull().map_err(malformed)? {
        while let Some(chunk) = segment.pull(&mut scratch).map_err(malformed)? {
            out.push_str(chunk);
        }
    }
    Ok(out)
}

fn malformed<E: std::fmt::Debug>(err: ciborium_ll::Error<E>) -> DecodeError {
    match err {
        ciborium_ll::Error::Io(e) => DecodeError::Malformed(format!("truncated input: {:?}", e)),
        ciborium_ll::Error::Syntax(offset) => {
            DecodeError::Malformed(format!("invalid CBOR at byte {}", offset))
        }
    }
}

/// Encode a map with indefinite outer framing.
pub fn encode(map: &TaggedMap) -> Result<Vec<u8>, EncodeError> {
    encode_with_limit(map, usize::MAX)
}

/// Encode a map, refusing to produce more than `limit` bytes.
///
/// The exact size is computed before anything is allocated, so an oversized
/// map never reaches the allocator.
pub fn encode_with_limit(map: &TaggedMap, limit: usize) -> Result<Vec<u8>, EncodeError> {
    let size = encoded_map_len(map)?;
    if size > limit {
        return Err(EncodeError::ExceedsLimit { size, limit });
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(size).map_err(|_| {
        EncodeError::SerializationFailed(format!("cannot allocate {} bytes", size))
    })?;

    buf.push(INDEFINITE_MAP);
    for (key, value) in &map.entries {
        encode_value_to(&mut buf, key)?;
        encode_value_to(&mut buf, value)?;
    }
    buf.push(BREAK);

    debug_assert_eq!(buf.len(), size);
    Ok(buf)
}

/// Encode a single item with definite lengths throughout.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(encoded_len(value)?);
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Size of the encoded map: framing byte, entries, break.
fn encoded_map_len(map: &TaggedMap) -> Result<usize, EncodeError> {
    map.entries.iter().try_fold(2usize, |acc, (k, v)| {
        let entry = encoded_len(k)?.saturating_add(encoded_len(v)?);
        Ok(acc.saturating_add(entry))
    })
}

/// Size of one encoded value.
fn encoded_len(value: &Value) -> Result<usize, EncodeError> {
    let len = match value {
        Value::Integer(i) => {
            let (_, n) = integer_head(*i)?;
            head_len(n)
        }
        Value::Bytes(b) => head_len(b.len() as u64).saturating_add(b.len()),
        Value::Text(s) => head_len(s.len() as u64).saturating_add(s.len()),
        Value::Array(arr) => arr
            .iter()
            .try_fold(head_len(arr.len() as u64), |acc, item| {
                Ok::<_, EncodeError>(acc.saturating_add(encoded_len(item)?))
            })?,
        Value::Map(entries) => {
            entries
                .iter()
                .try_fold(head_len(entries.len() as u64), |acc, (k, v)| {
                    let entry = encoded_len(k)?.saturating_add(encoded_len(v)?);
                    Ok::<_, EncodeError>(acc.saturating_add(entry))
                })?
        }
        Value::Tag(tag, inner) => head_len(*tag).saturating_add(encoded_len(inner)?),
        Value::Float(f) => {
            if single_is_lossless(*f) {
                5
            } else {
                9
            }
        }
        Value::Bool(_) | Value::Null | Value::Undefined => 1,
        Value::Simple(n) => simple_head(*n)?.len(),
    };
    Ok(len)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Integer(i) => {
            let (major, n) = integer_head(*i)?;
            encode_uint(buf, major, n);
        }
        Value::Bytes(b) => {
            encode_uint(buf, major::BYTES, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, major::TEXT, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, major::ARRAY, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => {
            encode_uint(buf, major::MAP, entries.len() as u64);
            for (k, v) in entries {
                encode_value_to(buf, k)?;
                encode_value_to(buf, v)?;
            }
        }
        Value::Tag(tag, inner) => {
            encode_uint(buf, major::TAG, *tag);
            encode_value_to(buf, inner)?;
        }
        Value::Float(f) => encode_float(buf, *f),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Undefined => buf.push(0xf7),
        Value::Simple(n) => buf.extend_from_slice(&simple_head(*n)?),
    }
    Ok(())
}

/// Split an integer into its major type and argument.
///
/// CBOR encodes -1 as 0, -2 as 1, and so on.
fn integer_head(n: i128) -> Result<(u8, u64), EncodeError> {
    let (major, arg) = if n >= 0 {
        (major::UNSIGNED, n)
    } else {
        (major::NEGATIVE, -1 - n)
    };
    let arg = u64::try_from(arg)
        .map_err(|_| EncodeError::SerializationFailed(format!("integer {} out of range", n)))?;
    Ok((major, arg))
}

/// Bytes needed for a head carrying `n`.
fn head_len(n: u64) -> usize {
    if n < 24 {
        1
    } else if n <= 0xff {
        2
    } else if n <= 0xffff {
        3
    } else if n <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// Encode a head with the given major type, using the smallest argument width.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn single_is_lossless(f: f64) -> bool {
    f.is_nan() || f64::from(f as f32) == f
}

fn encode_float(buf: &mut Vec<u8>, f: f64) {
    if single_is_lossless(f) {
        buf.push(0xfa);
        buf.extend_from_slice(&(f as f32).to_be_bytes());
    } else {
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_be_bytes());
    }
}

/// Head bytes for a simple value. 24..=31 have no valid encoding.
fn simple_head(n: u8) -> Result<Vec<u8>, EncodeError> {
    match n {
        0..=23 => Ok(vec![0xe0 | n]),
        24..=31 => Err(EncodeError::SerializationFailed(format!(
            "simple value {} has no valid encoding",
            n
        ))),
        _ => Ok(vec![0xf8, n]),
    }
}
