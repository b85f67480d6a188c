use crate::config::{Config, RconConfig, Settings};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Validates one server's connection parameters
pub fn validate_connection(name: &str, config: &RconConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Connection '{}' has empty host",
            name
        )));
    }

    if config.port == 0 {
        return Err(Error::ConfigInvalid(format!(
            "Connection '{}' has port 0",
            name
        )));
    }

    Ok(())
}

/// Validates a map of per-server connection overrides
pub fn validate_connections(configs: &HashMap<String, RconConfig>) -> Result<()> {
    for (name, config) in configs {
        validate_connection(name, config)?;
    }

    Ok(())
}

/// Validates the core behavior settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.operation_timeout_secs == 0 {
        return Err(Error::ConfigInvalid(
            "operationTimeoutSecs must be at least 1".to_string(),
        ));
    }

    if settings.poll_interval_secs == 0
        || settings.active_poll_interval_secs == 0
        || settings.idle_poll_interval_secs == 0
    {
        return Err(Error::ConfigInvalid(
            "polling intervals must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &Config) -> Result<()> {
    validate_connection("defaults", &config.defaults)?;
    validate_connections(&config.servers)?;
    validate_settings(&config.settings)?;

    Ok(())
}
