//! Synthesis configuration

use serde::{Deserialize, Serialize};

/// Which fields drive the consistency check and which values are surfaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Field holding the current price
    pub price_field: String,

    /// Field holding the estimated fair value
    pub fair_value_field: String,

    /// Field holding the stated recommendation (`buy`, `hold`, `sell`)
    pub recommendation_field: String,

    /// Gap magnitude within which any recommendation is accepted
    pub neutral_band: f64,

    /// Penalty applied to synthesis confidence on a consistency violation
    pub structural_mismatch_penalty: f64,

    /// Names to surface; `None` surfaces everything. Entries ending in `.*`
    /// match every name under that prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surfaced_fields: Option<Vec<String>>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            price_field: "price".to_string(),
            fair_value_field: "fair_value".to_string(),
            recommendation_field: "recommendation".to_string(),
            neutral_band: 0.02,
            structural_mismatch_penalty: 0.25,
            surfaced_fields: None,
        }
    }
}

impl SynthesisConfig {
    /// Whether a value with this name should appear in the finding
    pub fn surfaces(&self, name: &str) -> bool {
        let Some(allowed) = &self.surfaced_fields else {
            return true;
        };
        allowed.iter().any(|pattern| match pattern.strip_suffix(".*") {
            Some(prefix) => name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.')),
            None => pattern == name,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("price_field", &self.price_field),
            ("fair_value_field", &self.fair_value_field),
            ("recommendation_field", &self.recommendation_field),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        if !(0.0..1.0).contains(&self.neutral_band) {
            return Err(format!("neutral_band must be in [0.0, 1.0), got {}", self.neutral_band));
        }
        if !(0.0..=1.0).contains(&self.structural_mismatch_penalty) {
            return Err(format!(
                "structural_mismatch_penalty must be in [0.0, 1.0], got {}",
                self.structural_mismatch_penalty
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
