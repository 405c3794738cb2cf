//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the generation coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Capacity of the command channel feeding the coordinator loop.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Fail jobs whose worker has not reported after this long (milliseconds).
    /// Unset means a silent worker keeps its job alive until context teardown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timeout_ms: Option<u64>,

    /// How often to look for timed-out jobs (milliseconds).
    /// Only used when `generation_timeout_ms` is set.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

fn default_command_buffer() -> usize {
    256
}

fn default_sweep_interval() -> u64 {
    1000 // 1 second
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            command_buffer: default_command_buffer(),
            generation_timeout_ms: None,
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

impl CoordinatorConfig {
    /// Sets the generation timeout, rounded up to whole milliseconds.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_ms = Some(ceil_millis(timeout));
        self
    }

    /// Sets the timeout sweep interval, rounded up to whole milliseconds.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = ceil_millis(interval);
        self
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }

    /// Never shorter than 1 ms, even when `sweep_interval_ms` is 0.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }

    /// Channel capacity, at least 1 even when `command_buffer` is 0.
    pub fn channel_capacity(&self) -> usize {
        self.command_buffer.max(1)
    }
}

fn ceil_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.command_buffer, 256);
        assert!(config.generation_timeout_ms.is_none());
        assert!(config.generation_timeout().is_none());
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: CoordinatorConfig = toml::from_str("").unwrap();
        assert_eq!(config.command_buffer, 256);
        assert!(config.generation_timeout_ms.is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            command_buffer = 16
            generation_timeout_ms = 30000
            sweep_interval_ms = 250
        "#;
        let config: CoordinatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.command_buffer, 16);
        assert_eq!(config.generation_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.sweep_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder() {
        let config = CoordinatorConfig::default()
            .with_generation_timeout(Duration::from_millis(150))
            .with_sweep_interval(Duration::from_millis(10));
        assert_eq!(config.generation_timeout_ms, Some(150));
        assert_eq!(config.sweep_interval_ms, 10);
    }

    #[test]
    fn test_sub_millisecond_durations_round_up() {
        let config = CoordinatorConfig::default()
            .with_generation_timeout(Duration::from_micros(300))
            .with_sweep_interval(Duration::from_micros(500));
        assert_eq!(config.generation_timeout_ms, Some(1));
        assert_eq!(config.sweep_interval_ms, 1);

        let config = config.with_sweep_interval(Duration::from_micros(1500));
        assert_eq!(config.sweep_interval_ms, 2);
    }

    #[test]
    fn test_zero_values_stay_usable() {
        let config = CoordinatorConfig {
            command_buffer: 0,
            sweep_interval_ms: 0,
            ..CoordinatorConfig::default()
        };
        assert_eq!(config.channel_capacity(), 1);
        assert_eq!(config.sweep_interval(), Duration::from_millis(1));
    }
}
