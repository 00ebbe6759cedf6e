//! Gatekeeper configuration

use dasv_domain::{SampleMinimums, ValidationDepth};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum aggregate reliability for certification
    pub confidence_threshold: f64,

    /// Validation depth; tunes check severity
    pub depth: ValidationDepth,

    /// Weight of a flagged check in the aggregate (a pass weighs 1.0)
    pub flag_weight: f64,

    /// Largest relative difference accepted between stated and re-fetched price
    pub price_tolerance: f64,

    /// Bounded wait for the price re-fetch (milliseconds)
    pub recheck_timeout_ms: u64,

    /// Name of the adapter used to re-fetch the price; no re-fetch when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck_adapter: Option<String>,

    /// Values every finding must surface
    pub required_fields: Vec<String>,

    /// Disclosure values every finding must surface
    pub required_disclosures: Vec<String>,

    /// Field holding the current price
    pub price_field: String,

    /// Field holding the estimated fair value
    pub fair_value_field: String,

    /// Field holding the stated recommendation
    pub recommendation_field: String,

    /// Gap magnitude within which any recommendation is accepted
    pub neutral_band: f64,

    /// Minimums the significance re-check holds sample counts to
    pub sample_minimums: SampleMinimums,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ValidationConfig {
    /// Standard depth: 0.90 threshold, price required, no disclosures required
    pub fn standard() -> Self {
        Self {
            confidence_threshold: ValidationDepth::Standard.default_threshold(),
            depth: ValidationDepth::Standard,
            flag_weight: 0.75,
            price_tolerance: 0.02,
            recheck_timeout_ms: 5_000,
            recheck_adapter: None,
            sample_minimums: SampleMinimums::default(),
            required_fields: vec!["price".to_string()],
            required_disclosures: Vec::new(),
            price_field: "price".to_string(),
            fair_value_field: "fair_value".to_string(),
            recommendation_field: "recommendation".to_string(),
            neutral_band: 0.02,
        }
    }

    /// Comprehensive depth: methodology disclosure expected, basic-only samples flagged
    pub fn comprehensive() -> Self {
        Self {
            depth: ValidationDepth::Comprehensive,
            confidence_threshold: ValidationDepth::Comprehensive.default_threshold(),
            required_disclosures: vec!["disclosure.methodology".to_string()],
            ..Self::standard()
        }
    }

    /// Institutional depth: 0.95 threshold, 1% price tolerance, missing disclosures fail
    pub fn institutional() -> Self {
        Self {
            depth: ValidationDepth::Institutional,
            confidence_threshold: ValidationDepth::Institutional.default_threshold(),
            price_tolerance: 0.01,
            required_disclosures: vec![
                "disclosure.methodology".to_string(),
                "disclosure.conflicts".to_string(),
            ],
            ..Self::standard()
        }
    }

    /// Preset for a depth
    pub fn for_depth(depth: ValidationDepth) -> Self {
        match depth {
            ValidationDepth::Standard => Self::standard(),
            ValidationDepth::Comprehensive => Self::comprehensive(),
            ValidationDepth::Institutional => Self::institutional(),
        }
    }

    /// Price re-fetch timeout as a Duration
    pub fn recheck_timeout(&self) -> Duration {
        Duration::from_millis(self.recheck_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(format!(
                "confidence_threshold must be in (0.0, 1.0], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.flag_weight) {
            return Err(format!("flag_weight must be in [0.0, 1.0], got {}", self.flag_weight));
        }
        for (name, value) in [
            ("price_tolerance", self.price_tolerance),
            ("neutral_band", self.neutral_band),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0), got {}", name, value));
            }
        }
        if self.recheck_timeout_ms == 0 {
            return Err("recheck_timeout_ms must be greater than 0".to_string());
        }
        if self.recheck_adapter.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("recheck_adapter must not be empty".to_string());
        }
        self.sample_minimums.validate().map_err(|e| e.to_string())?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config, ValidationConfig::standard());
        assert_eq!(config.confidence_threshold, 0.90);
        assert!(config.required_disclosures.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_institutional_config() {
        let config = ValidationConfig::institutional();
        assert_eq!(config.confidence_threshold, 0.95);
        assert_eq!(config.required_disclosures.len(), 2);
        assert_eq!(ValidationConfig::for_depth(ValidationDepth::Institutional), config);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let config = ValidationConfig {
            confidence_threshold: 0.0,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ValidationConfig {
            confidence_threshold: 1.2,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ValidationConfig::comprehensive();
        let parsed = ValidationConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);

        let partial = ValidationConfig::from_toml("depth = \"institutional\"").unwrap();
        assert_eq!(partial.depth, ValidationDepth::Institutional);
        // Unspecified values come from the standard preset
        assert_eq!(partial.confidence_threshold, 0.90);
    }

    #[test]
    fn test_recheck_adapter_from_toml() {
        let config = ValidationConfig::from_toml("recheck_adapter = \"quotes\"").unwrap();
        assert_eq!(config.recheck_adapter.as_deref(), Some("quotes"));
        assert!(config.validate().is_ok());
        assert!(ValidationConfig::default().recheck_adapter.is_none());

        let blank = ValidationConfig {
            recheck_adapter: Some("  ".to_string()),
            ..ValidationConfig::default()
        };
        assert!(blank.validate().is_err());
    }
}
