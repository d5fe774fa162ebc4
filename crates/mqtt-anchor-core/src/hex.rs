//! `0x`-prefixed lowercase hex, the text form the ledger expects for tags
//! and data.

/// Encode bytes as `"0x"` followed by two lowercase hex digits per byte.
///
/// Total over every input; the empty slice encodes as `"0x"`.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    out.push_str(&hex::encode(bytes));
    out
}

/// Decode hex text, with or without a leading `0x`.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits)
}
