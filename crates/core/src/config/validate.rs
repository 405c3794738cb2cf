use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Coordinator command buffer and sweep interval are not 0
/// - Generation timeout, when set, is not 0
/// - Worker write buffer is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.coordinator.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "coordinator.command_buffer cannot be 0".to_string(),
        ));
    }

    if config.coordinator.generation_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "coordinator.generation_timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.coordinator.sweep_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "coordinator.sweep_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.worker.write_buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "worker.write_buffer_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
