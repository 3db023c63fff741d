//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-invocation expression cost budget.
pub const DEFAULT_RUNTIME_COST_BUDGET: u64 = 10_000_000;

/// Default deadline for each external call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the validation handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Cost budget handed to the evaluator for each invocation.
    pub runtime_cost_budget: u64,

    /// Deadline for each external call, in milliseconds.
    pub call_timeout_ms: u64,

    /// Skip rules whose policy already has a generated native admission
    /// policy enforcing it.
    pub honor_generated_admission_policy: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            runtime_cost_budget: DEFAULT_RUNTIME_COST_BUDGET,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT.as_secs() * 1_000,
            honor_generated_admission_policy: true,
        }
    }
}

impl ValidateConfig {
    /// Parse from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_runtime_cost_budget(mut self, budget: u64) -> Self {
        self.runtime_cost_budget = budget;
        self
    }

    pub fn with_honor_generated_admission_policy(mut self, honor: bool) -> Self {
        self.honor_generated_admission_policy = honor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidateConfig::default();
        assert_eq!(config.runtime_cost_budget, DEFAULT_RUNTIME_COST_BUDGET);
        assert_eq!(config.call_timeout(), DEFAULT_CALL_TIMEOUT);
        assert!(config.honor_generated_admission_policy);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ValidateConfig::from_toml_str("call_timeout_ms = 250\n").unwrap();
        assert_eq!(config.call_timeout(), Duration::from_millis(250));
        assert_eq!(config.runtime_cost_budget, DEFAULT_RUNTIME_COST_BUDGET);
    }

    #[test]
    fn test_full_toml() {
        let config = ValidateConfig::from_toml_str(
            r#"
runtime_cost_budget = 500
call_timeout_ms = 1000
honor_generated_admission_policy = false
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            ValidateConfig::default()
                .with_runtime_cost_budget(500)
                .with_call_timeout(Duration::from_secs(1))
                .with_honor_generated_admission_policy(false)
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ValidateConfig::from_toml_str("call_timeout_ms = \"soon\"").is_err());
    }
}
