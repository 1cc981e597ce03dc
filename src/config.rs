// Configuration management

use crate::core::errors::TicketingError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::path::PathBuf;

/// Minimum HS256 secret length in bytes
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Application configuration loaded from environment variables
///
/// Runs against Postgres when `DATABASE_URL` is set, otherwise against an
/// in-memory store seeded from `SEED_YAML_PATH`.
#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Storage configuration
    pub database_url: Option<String>,
    pub seed_yaml_path: Option<PathBuf>,

    // Token configuration
    pub jwt_secret: SecretString,
    pub jwt_expires_in_secs: u64,

    // CORS origin of the web frontend
    pub frontend_url: String,

    // Middleware configuration
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, TicketingError> {
        // Load .env file if present (development)
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build and validate a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TicketingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let config = Self {
            bind_address: vars.get_or_default("BIND_ADDRESS", "0.0.0.0"),
            port: vars.parse_port()?,
            database_url: vars.get_optional("DATABASE_URL"),
            seed_yaml_path: vars.get_optional("SEED_YAML_PATH").map(PathBuf::from),
            jwt_secret: vars.get_required("JWT_SECRET").map(SecretString::new)?,
            jwt_expires_in_secs: vars.parse_or_default("JWT_EXPIRES_IN_SECS", 3600)?,
            frontend_url: vars.get_or_default("FRONTEND_URL", "http://localhost:3000"),
            request_timeout_secs: vars.parse_or_default("REQUEST_TIMEOUT_SECS", 30)?,
            body_size_limit_bytes: vars.parse_or_default("BODY_SIZE_LIMIT_BYTES", 1024 * 1024)?,
            log_level: vars.get_or_default("LOG_LEVEL", "info"),
            log_format: vars.get_or_default("LOG_FORMAT", "json"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), TicketingError> {
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_BYTES {
            return Err(TicketingError::ConfigurationError(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if let Some(ref url) = self.database_url {
            Self::validate_url(url, "Database URL")?;
        }
        Self::validate_url(&self.frontend_url, "Frontend URL")?;

        if let Some(ref path) = self.seed_yaml_path {
            if !path.is_file() {
                return Err(TicketingError::ConfigurationError(format!(
                    "Seed YAML file not found at {:?}",
                    path
                )));
            }
        }

        if self.database_url.is_none() && self.seed_yaml_path.is_none() {
            return Err(TicketingError::ConfigurationError(
                "Either DATABASE_URL or SEED_YAML_PATH must be set".to_string(),
            ));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate URL format
    fn validate_url(url: &str, description: &str) -> Result<(), TicketingError> {
        url::Url::parse(url).map_err(|e| {
            TicketingError::ConfigurationError(format!("Invalid {} '{}': {}", description, url, e))
        })?;
        Ok(())
    }

    /// Validate log level
    fn validate_log_level(level: &str) -> Result<(), TicketingError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(TicketingError::ConfigurationError(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Validate log format
    fn validate_log_format(format: &str) -> Result<(), TicketingError> {
        if format != "json" && format != "text" {
            return Err(TicketingError::ConfigurationError(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }

    /// Create a test configuration for unit tests
    ///
    /// Bypasses environment loading and validation.
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3001,
            database_url: None,
            seed_yaml_path: None,
            jwt_secret: SecretString::new("test-secret-that-is-at-least-32-bytes-long".to_string()),
            jwt_expires_in_secs: 3600,
            frontend_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            body_size_limit_bytes: 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Typed access to a key lookup
struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    fn get_required(&self, key: &str) -> Result<String, TicketingError> {
        self.get_optional(key)
            .ok_or_else(|| TicketingError::ConfigurationError(format!("{} not set", key)))
    }

    fn parse_port(&self) -> Result<u16, TicketingError> {
        let port_str = self.get_or_default("PORT", "3001");
        let port = port_str.parse::<u16>().map_err(|e| {
            TicketingError::ConfigurationError(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(TicketingError::ConfigurationError(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }
        Ok(port)
    }

    /// Parse a positive number or fall back to `default`
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, TicketingError>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::fmt::Display,
    {
        match self.get_optional(key) {
            Some(value) => {
                let parsed = value.parse::<T>().map_err(|e| {
                    TicketingError::ConfigurationError(format!(
                        "Invalid {} value '{}': {}",
                        key, value, e
                    ))
                })?;

                if parsed == T::default() {
                    return Err(TicketingError::ConfigurationError(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }
                Ok(parsed)
            }
            None => Ok(default),
        }
    }
}
