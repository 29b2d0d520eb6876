use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Tick interval is not 0
/// - Next stage and consent dialog keys are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.update.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "update.tick_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.update.next_stage.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "update.next_stage cannot be empty".to_string(),
        ));
    }

    let consent = &config.update.consent;
    for (field, key) in [
        ("title_key", &consent.title_key),
        ("message_key", &consent.message_key),
        ("confirm_key", &consent.confirm_key),
        ("cancel_key", &consent.cancel_key),
    ] {
        if key.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "update.consent.{} cannot be empty",
                field
            )));
        }
    }

    Ok(())
}
