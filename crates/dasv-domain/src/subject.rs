//! Analysis subjects

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the entity under analysis (a ticker, sector, or industry)
///
/// Normalized to trimmed upper case so `aapl` and `AAPL ` name the same
/// subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a subject identifier
    ///
    /// # Errors
    /// Returns an error if the identifier is blank
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = value.as_ref().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "subject identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Get the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl std::str::FromStr for SubjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_normalization() {
        let id = SubjectId::new("  aapl ").unwrap();
        assert_eq!(id.as_str(), "AAPL");
        assert_eq!(id, "AAPL".parse().unwrap());
    }

    #[test]
    fn test_blank_subject_rejected() {
        assert!(SubjectId::new("   ").is_err());
    }

    #[test]
    fn test_subject_serde() {
        let id: SubjectId = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(id.as_str(), "MSFT");
        assert!(serde_json::from_str::<SubjectId>("\"\"").is_err());
    }
}
