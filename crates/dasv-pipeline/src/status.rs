//! Run status and exit codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a full run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every subject ran to completion and was certified
    SuccessCertified,
    /// Every subject ran to completion; at least one failed the gate
    SuccessRejected,
    /// At least one subject could not complete
    PartialFailure,
    /// Invalid threshold or sample configuration
    ConfigError,
}

impl RunStatus {
    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::SuccessCertified => 0,
            RunStatus::SuccessRejected => 1,
            RunStatus::PartialFailure => 2,
            RunStatus::ConfigError => 3,
        }
    }

    /// Snake-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::SuccessCertified => "success_certified",
            RunStatus::SuccessRejected => "success_rejected",
            RunStatus::PartialFailure => "partial_failure",
            RunStatus::ConfigError => "config_error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes: Vec<i32> = [
            RunStatus::SuccessCertified,
            RunStatus::SuccessRejected,
            RunStatus::PartialFailure,
            RunStatus::ConfigError,
        ]
        .iter()
        .map(RunStatus::exit_code)
        .collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_serialized_name() {
        assert_eq!(RunStatus::PartialFailure.to_string(), "partial_failure");
    }
}
