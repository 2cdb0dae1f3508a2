use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Rule file location is not blank
/// - Timeouts and the polling interval are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.rules.location.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "rules.location cannot be empty".to_string(),
        ));
    }

    let durations = [
        ("rules.fetch_timeout_secs", config.rules.fetch_timeout_secs),
        ("probe.timeout_ms", config.probe.timeout_ms),
        ("speed.poll_interval_ms", config.speed.poll_interval_ms),
        ("speed.request_timeout_secs", config.speed.request_timeout_secs),
    ];
    if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
    }

    Ok(())
}
