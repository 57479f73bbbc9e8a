//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, ChimeConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ChimeConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_plugin_list(&config.plugins)?;

    if config.connection.addr.trim().is_empty() {
        return Err(ConfigError::missing_field("connection.addr"));
    }

    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.nick.is_empty() {
        return Err(ConfigError::missing_field("bot.nick"));
    }
    if bot.nick.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Nick cannot contain spaces"));
    }

    if bot.command_prefix.is_empty() {
        return Err(ConfigError::missing_field("bot.command_prefix"));
    }
    if bot.command_prefix.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Command prefix cannot contain spaces"));
    }

    Ok(())
}

fn validate_plugin_list(plugins: &[String]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in plugins {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicatePlugin(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ChimeConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_bot_settings() {
        let mut config = ChimeConfig::default();
        config.bot.nick = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.bot.nick = "two words".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.bot.nick = "chime".into();
        config.bot.command_prefix = String::new();
        assert!(validate_config(&config).is_err());

        config.bot.command_prefix = "! ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_duplicate_plugins() {
        let config = ChimeConfig {
            plugins: vec!["echo".into(), "karma".into(), "echo".into()],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicatePlugin(name)) if name == "echo"
        ));
    }
}
