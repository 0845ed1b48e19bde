//! Configuration validation utilities.

use crate::config::{Config, ConfigError};

const VALID_OUTPUT_FORMATS: &[&str] = &["structured", "json", "markdown"];

/// Basic structural validation: required sections present, and any values
/// that must come from a fixed set actually do.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.commands.is_empty() {
        return Err(ConfigError::Invalid(
            "missing required section: commands".to_string(),
        ));
    }

    if config.script_paths.is_empty() {
        return Err(ConfigError::Invalid(
            "missing required section: script_paths".to_string(),
        ));
    }

    if !VALID_OUTPUT_FORMATS.contains(&config.output.format.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "output.format must be one of {:?}, got '{}'",
            VALID_OUTPUT_FORMATS, config.output.format
        )));
    }

    for mapping in config.commands.values() {
        if mapping.pattern.is_none() && mapping.fallback.is_none() && mapping.targets.is_empty() {
            return Err(ConfigError::Invalid(
                "a command mapping must define at least one of: pattern, fallback, or a target-kind key"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_commands_rejected() {
        let mut config = Config::default();
        config.commands.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_output_format_rejected() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();
        assert!(validate(&config).is_err());
    }
}
