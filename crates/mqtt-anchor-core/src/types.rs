//! Strong type definitions shared by the codec, the ledger adapter and the
//! pipeline.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, TimeZone};

use crate::error::BlockIdError;

/// Maximum length of a block identifier in bytes, `0x` prefix included.
///
/// Stardust block ids are 32 bytes (66 characters as hex); the bound leaves
/// room for longer identifiers from other networks.
pub const MAX_BLOCK_ID_LEN: usize = 128;

/// A ledger block identifier, embedded into payloads as the verification token.
///
/// Always starts with `0x`, is printable ASCII, and is at most
/// [`MAX_BLOCK_ID_LEN`] bytes long.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    /// Validate a block identifier reported by a ledger client.
    pub fn parse(text: &str) -> Result<Self, BlockIdError> {
        if text.len() > MAX_BLOCK_ID_LEN {
            return Err(BlockIdError::TooLong(text.len()));
        }
        let Some(rest) = text.strip_prefix("0x") else {
            return Err(BlockIdError::MissingPrefix);
        };
        if rest.is_empty() {
            return Err(BlockIdError::Empty);
        }
        if let Some(pos) = text.bytes().position(|b| !b.is_ascii_graphic()) {
            return Err(BlockIdError::NotPrintable(pos));
        }
        Ok(Self(text.to_owned()))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the identifier text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BlockId {
    type Error = BlockIdError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

/// Time at which the pipeline received a message, in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngestionTime(u64);

impl IngestionTime {
    /// Wrap a millisecond timestamp.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Read the wall clock.
    ///
    /// A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a `SystemTime`, clamping to the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Whole seconds since the Unix epoch.
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// ISO-8601 rendering at second precision, host wall clock.
    pub fn to_iso8601(&self) -> Option<String> {
        timestamp_to_iso8601(self.as_secs())
    }
}

/// Render Unix seconds as `YYYY-MM-DDTHH:MM:SSZ` on the host's wall clock.
///
/// The trailing `Z` is a literal and does not mean UTC: on a host at
/// `+01:00`, `1733393632` renders as `2024-12-05T11:13:52Z`.
///
/// Returns `None` for instants chrono cannot represent.
pub fn timestamp_to_iso8601(unix_secs: u64) -> Option<String> {
    timestamp_to_iso8601_in(unix_secs, &Local)
}

/// Same as [`timestamp_to_iso8601`], with the wall clock of `tz`.
pub fn timestamp_to_iso8601_in<Tz>(unix_secs: u64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let secs = i64::try_from(unix_secs).ok()?;
    let datetime = DateTime::from_timestamp(secs, 0)?.with_timezone(tz);
    Some(datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use std::time::Duration;

    fn central_europe() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn test_block_id_accepts_hex() {
        let id = BlockId::parse("0xabc123").unwrap();
        assert_eq!(id.as_str(), "0xabc123");
        assert_eq!(format!("{}", id), "0xabc123");
        assert_eq!(format!("{:?}", id), "BlockId(0xabc123)");
    }

    #[test]
    fn test_block_id_requires_prefix() {
        assert_eq!(BlockId::parse("abc123"), Err(BlockIdError::MissingPrefix));
        assert_eq!(BlockId::parse("0x"), Err(BlockIdError::Empty));
    }

    #[test]
    fn test_block_id_length_bound() {
        let max = format!("0x{}", "a".repeat(MAX_BLOCK_ID_LEN - 2));
        assert!(BlockId::parse(&max).is_ok());

        let over = format!("0x{}", "a".repeat(MAX_BLOCK_ID_LEN - 1));
        assert_eq!(
            BlockId::parse(&over),
            Err(BlockIdError::TooLong(MAX_BLOCK_ID_LEN + 1))
        );
    }

    #[test]
    fn test_block_id_rejects_control_chars() {
        assert_eq!(BlockId::parse("0xab\ncd"), Err(BlockIdError::NotPrintable(4)));
        assert_eq!(BlockId::parse("0xab cd"), Err(BlockIdError::NotPrintable(4)));
    }

    #[test]
    fn test_iso8601_known_instant() {
        assert_eq!(
            timestamp_to_iso8601_in(1733393632, &central_europe()).as_deref(),
            Some("2024-12-05T11:13:52Z")
        );
        assert_eq!(
            timestamp_to_iso8601_in(0, &central_europe()).as_deref(),
            Some("1970-01-01T01:00:00Z")
        );
    }

    #[test]
    fn test_iso8601_suffix_is_literal() {
        // Same instant, different wall clock, same suffix.
        assert_eq!(
            timestamp_to_iso8601_in(1733393632, &Utc).as_deref(),
            Some("2024-12-05T10:13:52Z")
        );
    }

    #[test]
    fn test_iso8601_uses_host_clock() {
        assert_eq!(
            timestamp_to_iso8601(1733393632),
            timestamp_to_iso8601_in(1733393632, &Local)
        );
    }

    #[test]
    fn test_iso8601_out_of_range() {
        assert_eq!(timestamp_to_iso8601(u64::MAX), None);
        assert_eq!(timestamp_to_iso8601_in(u64::MAX, &Utc), None);
    }

    #[test]
    fn test_ingestion_time_from_system_time() {
        let t = UNIX_EPOCH + Duration::from_millis(1733393632123);
        let ingestion = IngestionTime::from_system_time(t);
        assert_eq!(ingestion.as_millis(), 1733393632123);
        assert_eq!(ingestion.as_secs(), 1733393632);
        assert_eq!(ingestion.to_iso8601(), timestamp_to_iso8601(1733393632));
    }

    #[test]
    fn test_ingestion_time_before_epoch_clamps() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(IngestionTime::from_system_time(t).as_millis(), 0);
    }
}
