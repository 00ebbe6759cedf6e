//! Record identifiers

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a pipeline record based on UUIDv7
///
/// Discovery, analysis, finding and verdict records all carry one. UUIDv7
/// keeps identifiers chronologically sortable, so a corrected record issued
/// later always sorts after the record it supersedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use dasv_domain::RecordId;
    ///
    /// let id = RecordId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create a RecordId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Parse a RecordId from its string form
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidIdentifier(format!("{}: {}", s, e)))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0.as_u128()
    }

    /// Milliseconds since Unix epoch encoded in the UUIDv7 prefix
    pub fn timestamp_ms(&self) -> u64 {
        (self.value() >> 80) as u64
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_ordering() {
        let id1 = RecordId::from_value(1000);
        let id2 = RecordId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_record_id_chronological() {
        let id1 = RecordId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = RecordId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should sort first");
        assert!(id1.timestamp_ms() <= id2.timestamp_ms());
    }

    #[test]
    fn test_record_id_display_and_parse() {
        let id = RecordId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(RecordId::parse(&text).unwrap(), id);
    }

    #[test]
    fn test_record_id_invalid_string() {
        assert!(RecordId::parse("not-a-uuid").is_err());
        assert!(RecordId::parse("").is_err());
    }
}
