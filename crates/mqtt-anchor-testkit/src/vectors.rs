//! Golden test vectors for byte-exact verification.
//!
//! Each vector fixes an inbound payload, a receive time and the block id the
//! ledger hands back, and records the exact enriched bytes that must come
//! out of the pipeline.

use mqtt_anchor_core::{decode, encode, hex_to_bytes, DecodeError, EncodeError, Value};

/// Key of the receive-time entry.
const INGESTION_TIME: &str = "INGESTION_TIME";

/// Key of the block-id entry.
const VERIFICATION_TOKEN: &str = "VERIFICATION_TOKEN";

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub description: &'static str,
    /// Inbound payload (hex).
    pub input_hex: &'static str,
    /// Receive time in milliseconds since the Unix epoch.
    pub ingestion_ms: u64,
    /// Block id returned by the ledger.
    pub block_id: String,
    /// Expected enriched payload (hex).
    pub expected_hex: &'static str,
}

impl GoldenVector {
    pub fn input(&self) -> Vec<u8> {
        hex_to_bytes(self.input_hex).unwrap_or_default()
    }

    pub fn expected(&self) -> Vec<u8> {
        hex_to_bytes(self.expected_hex).unwrap_or_default()
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "single-entry",
            description: r#"{_ "t": 21}"#,
            input_hex: "bf617415ff",
            ingestion_ms: 1733393632000, // 2024-12-05T11:13:52Z
            block_id: "0xabc123".into(),
            expected_hex: "bf6174156e494e47455354494f4e5f54494d451b00000193964fcb00\
                           72564552494649434154494f4e5f544f4b454e683078616263313233ff",
        },
        GoldenVector {
            name: "empty-map",
            description: "{_ } with a full-length block id",
            input_hex: "bfff",
            ingestion_ms: 0,
            block_id: format!("0x{}", "ab".repeat(32)),
            expected_hex: "bf6e494e47455354494f4e5f54494d450072564552494649434154494f\
                           4e5f544f4b454e78423078616261626162616261626162616261626162\
                           616261626162616261626162616261626162616261626162616261626162\
                           61626162616261626162616261626162ff",
        },
        GoldenVector {
            name: "nested-values",
            description: r#"{_ "id": h'0102', "vals": [1, -1], "ok": true}"#,
            input_hex: "bf6269644201026476616c73820120626f6bf5ff",
            ingestion_ms: 1700000000123,
            block_id: format!("0x{}", "0123456789abcdef".repeat(4)),
            expected_hex: "bf6269644201026476616c73820120626f6bf56e494e47455354494f4e\
                           5f54494d451b0000018bcfe5687b72564552494649434154494f4e5f54\
                           4f4b454e78423078303132333435363738396162636465663031323334\
                           353637383961626364656630313233343536373839616263646566303132\
                           33343536373839616263646566ff",
        },
        GoldenVector {
            name: "inner-indefinite-array",
            description: r#"{_ "a": [_ 1, 2]}; the inner array comes back definite"#,
            input_hex: "bf61619f0102ffff",
            ingestion_ms: 1733393632000,
            block_id: "0x01".into(),
            expected_hex: "bf61618201026e494e47455354494f4e5f54494d451b00000193964fcb00\
                           72564552494649434154494f4e5f544f4b454e6430783031ff",
        },
    ]
}

/// Errors from replaying a vector through the codec.
#[derive(Debug)]
pub enum ReplayError {
    Decode(DecodeError),
    Encode(EncodeError),
}

/// Apply a vector's enrichment with the codec alone, no ledger involved.
pub fn replay(vector: &GoldenVector) -> Result<Vec<u8>, ReplayError> {
    let mut map = decode(&vector.input()).map_err(ReplayError::Decode)?;
    map.append(INGESTION_TIME, vector.ingestion_ms)
        .map_err(ReplayError::Encode)?;
    map.append(VERIFICATION_TOKEN, Value::Text(vector.block_id.clone()))
        .map_err(ReplayError::Encode)?;
    encode(&map).map_err(ReplayError::Encode)
}
