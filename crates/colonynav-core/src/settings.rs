//! Loading navigation tuning from JSON.

use colonynav_logic::config::{validate_config, NavConfig};

use crate::error::ConfigError;

/// Parse and validate a [`NavConfig`]. Missing fields keep their defaults.
pub fn load_config(json: &str) -> Result<NavConfig, ConfigError> {
    let config: NavConfig = serde_json::from_str(json)?;
    check_config(&config)?;
    Ok(config)
}

/// Validate an in-memory config, failing with every issue found.
pub fn check_config(config: &NavConfig) -> Result<(), ConfigError> {
    let issues = validate_config(config);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(issues))
    }
}
