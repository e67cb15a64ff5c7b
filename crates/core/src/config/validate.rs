use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pool has at least one worker and a non-empty queue
/// - Converter timeout, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .conversion
        .pool()
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("conversion: {}", e)))?;

    if config.converter.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
