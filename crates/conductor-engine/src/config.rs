use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Instance name used in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Upper bound on concurrently processed batch tasks.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
    /// Backoff configuration for the retry controller.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per-agent deadline for health-check pings, in milliseconds.
    #[serde(default = "default_health_timeout_ms")]
    pub health_check_timeout_ms: u64,
}

fn default_name() -> String {
    "conductor".to_string()
}

fn default_max_concurrent() -> usize {
    10
}

fn default_health_timeout_ms() -> u64 {
    2_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_concurrent_tasks: default_max_concurrent(),
            retry: RetryPolicy::default(),
            health_check_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// The health-check ping deadline as a [`Duration`].
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.name, "conductor");
        assert_eq!(config.max_concurrent_tasks, 10);
        assert_eq!(config.retry.backoff_base_ms, 500);
        assert_eq!(config.health_check_timeout(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_concurrent_tasks": 3}"#).unwrap();
        assert_eq!(config.max_concurrent_tasks, 3);
        assert_eq!(config.name, "conductor");
    }
}
