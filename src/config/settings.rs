//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub gemini: GeminiConfig,
    pub generation: GenerationConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Retry policy for generation calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    pub max_retries: u32,
    /// Length of one backoff unit; attempt `i` waits `2^(i+1)` units
    pub backoff_unit_ms: u64,
}

/// Token authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub token_length: usize,
    pub min_password_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stderr only when unset
    pub directory: Option<String>,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit configuration file
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name(path).required(true))
    }

    fn load(file: config::File<config::FileSourceFile, config::FileFormat>) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("STUDYBUDDY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::StudyBuddyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/studybuddy".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            gemini: GeminiConfig {
                api_key: String::new(),
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                timeout_seconds: 60,
            },
            generation: GenerationConfig {
                max_retries: 3,
                backoff_unit_ms: 1000,
            },
            auth: AuthConfig {
                token_length: 40,
                min_password_length: 8,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.generation.max_retries, 3);
        assert_eq!(settings.generation.backoff_unit_ms, 1000);
        assert_eq!(settings.auth.token_length, 40);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studybuddy.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[gemini]\napi_key = \"file-key\"\n\n[generation]\nmax_retries = 5\n"
        )
        .unwrap();

        let settings = Settings::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.gemini.api_key, "file-key");
        assert_eq!(settings.generation.max_retries, 5);
        // Untouched sections keep their defaults
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.database.max_connections, 10);
    }
}
