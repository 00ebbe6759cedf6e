//! Configuration for the Discovery Aggregator

use dasv_domain::FieldKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted staleness window: ten years in hours
pub const MAX_STALENESS_HOURS: u64 = 10 * 366 * 24;

/// Configuration for reconciliation, timeouts and observation hygiene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Relative tolerance for price-like fields
    pub price_tolerance: f64,

    /// Relative tolerance for other numeric fields
    pub numeric_tolerance: f64,

    /// Bounded wait per adapter call (milliseconds)
    pub adapter_timeout_ms: u64,

    /// Observations older than this, relative to the end of the as-of date, are stale
    pub max_staleness_hours: u64,

    /// Penalty applied to a stale observation's confidence
    pub staleness_penalty: f64,

    /// Penalty applied to observations from a degraded adapter
    pub degraded_penalty: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            price_tolerance: 0.02,
            numeric_tolerance: 0.02,
            adapter_timeout_ms: 5_000,
            max_staleness_hours: 72,
            staleness_penalty: 0.2,
            degraded_penalty: 0.1,
        }
    }
}

impl DiscoveryConfig {
    /// Strict preset: 1% tolerance, short timeout, one-day staleness window
    pub fn strict() -> Self {
        Self {
            price_tolerance: 0.01,
            numeric_tolerance: 0.01,
            adapter_timeout_ms: 2_000,
            max_staleness_hours: 24,
            staleness_penalty: 0.3,
            degraded_penalty: 0.2,
        }
    }

    /// Lenient preset: wider tolerance, long timeout, one-week staleness window
    pub fn lenient() -> Self {
        Self {
            price_tolerance: 0.05,
            numeric_tolerance: 0.05,
            adapter_timeout_ms: 15_000,
            max_staleness_hours: 168,
            staleness_penalty: 0.1,
            degraded_penalty: 0.05,
        }
    }

    /// Per-adapter timeout as a Duration
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    /// Tolerance for a field kind; `None` means exact match
    pub fn tolerance_for(&self, kind: FieldKind) -> Option<f64> {
        match kind {
            FieldKind::PriceLike => Some(self.price_tolerance),
            FieldKind::Numeric => Some(self.numeric_tolerance),
            FieldKind::Categorical => None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("price_tolerance", self.price_tolerance),
            ("numeric_tolerance", self.numeric_tolerance),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0), got {}", name, value));
            }
        }
        for (name, value) in [
            ("staleness_penalty", self.staleness_penalty),
            ("degraded_penalty", self.degraded_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0], got {}", name, value));
            }
        }
        if self.adapter_timeout_ms == 0 {
            return Err("adapter_timeout_ms must be greater than 0".to_string());
        }
        if self.max_staleness_hours == 0 || self.max_staleness_hours > MAX_STALENESS_HOURS {
            return Err(format!(
                "max_staleness_hours must be in [1, {}], got {}",
                MAX_STALENESS_HOURS, self.max_staleness_hours
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
