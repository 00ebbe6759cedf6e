//! Source health reporting

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status of a source adapter, independent of individual fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Fully operational
    Healthy,
    /// Operational but may omit fields or serve lower-quality data
    Degraded,
    /// Returned nothing for this run (error, timeout, or outage)
    Unavailable,
}

impl AdapterHealth {
    /// Get the health name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterHealth::Healthy => "healthy",
            AdapterHealth::Degraded => "degraded",
            AdapterHealth::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AdapterHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of one adapter for one discovery run, with the reason when not healthy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Reported or inferred health
    pub health: AdapterHealth,
    /// Why the adapter is degraded or unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SourceStatus {
    /// A healthy source
    pub fn healthy() -> Self {
        Self {
            health: AdapterHealth::Healthy,
            reason: None,
        }
    }

    /// A source with the given health and reason
    pub fn with_reason(health: AdapterHealth, reason: impl Into<String>) -> Self {
        Self {
            health,
            reason: Some(reason.into()),
        }
    }

    /// Whether the source contributed observations
    pub fn contributed(&self) -> bool {
        self.health != AdapterHealth::Unavailable
    }
}
