//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{StudyBuddyError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_gemini_config(&settings.gemini)?;
    validate_generation_config(&settings.generation)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(StudyBuddyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(StudyBuddyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(StudyBuddyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(StudyBuddyError::Config(
            "Database acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate Gemini configuration
///
/// An empty API key is allowed here; the client reports it on first use so
/// that database-only commands keep working without one.
fn validate_gemini_config(config: &super::GeminiConfig) -> Result<()> {
    if config.model.is_empty() {
        return Err(StudyBuddyError::Config(
            "Gemini model is required".to_string()
        ));
    }

    url::Url::parse(&config.base_url)?;

    if config.timeout_seconds == 0 {
        return Err(StudyBuddyError::Config(
            "Gemini timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate retry configuration
fn validate_generation_config(config: &super::GenerationConfig) -> Result<()> {
    if config.max_retries == 0 {
        return Err(StudyBuddyError::Config(
            "Max retries must be at least 1".to_string()
        ));
    }

    Ok(())
}

/// Validate auth configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.token_length < 20 {
        return Err(StudyBuddyError::Config(
            "Token length must be at least 20 characters".to_string()
        ));
    }

    if config.min_password_length == 0 {
        return Err(StudyBuddyError::Config(
            "Minimum password length must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(StudyBuddyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(StudyBuddyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_retries() {
        let mut settings = Settings::default();
        settings.generation.max_retries = 0;
        assert_matches!(validate_settings(&settings), Err(StudyBuddyError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_pool_bounds() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(StudyBuddyError::Config(_)));
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let mut settings = Settings::default();
        settings.gemini.base_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(StudyBuddyError::UrlParse(_)));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(validate_settings(&settings), Err(StudyBuddyError::Config(_)));
    }
}
