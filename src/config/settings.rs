//! Configuration settings for the watchgate service.

use std::env;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::GateError;

/// Environment variable holding the token signing secret.
pub const TOKEN_SECRET_VAR: &str = "WATCHGATE_TOKEN_SECRET";
/// Environment variable holding the SHA-256 hex digest of the site password.
pub const PASSWORD_DIGEST_VAR: &str = "WATCHGATE_PASSWORD_SHA256";
/// Environment variable holding the plaintext site password (legacy).
pub const PASSWORD_PLAINTEXT_VAR: &str = "WATCHGATE_PASSWORD";

/// Main configuration structure for the gate.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Production mode: error responses carry no internal detail.
    #[serde(default)]
    pub production: bool,
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Failed login attempts allowed before lockout.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    /// Lockout duration after too many failed attempts, in minutes.
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u64,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

// Default value functions
fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:3001".parse().expect("valid default bind addr")
}

fn default_max_login_attempts() -> u32 {
    5
}

fn default_lockout_minutes() -> u64 {
    15
}

fn default_token_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_body_bytes() -> usize {
    65_536
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            production: false,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: default_max_login_attempts(),
            lockout_minutes: default_lockout_minutes(),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GateError::config(
                format!("Failed to read config file '{}': {}", path.display(), e),
                "Pass --config <PATH> or create watchgate.toml",
            )
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            GateError::config(
                format!("Failed to parse config file '{}': {}", path.display(), e),
                "Check the TOML syntax against the documented settings",
            )
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), GateError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(GateError::config(
                format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
                "Set logging.level to one of the listed values",
            ));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(GateError::config(
                format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
                "Set logging.format to 'pretty' or 'json'",
            ));
        }

        if self.security.max_login_attempts == 0 {
            return Err(GateError::config(
                "security.max_login_attempts must be at least 1",
                "Raise max_login_attempts or remove it to use the default",
            ));
        }

        Ok(())
    }
}

/// The configured site credential, resolved once at startup.
///
/// A precomputed digest takes precedence over a plaintext secret when both
/// are present.
#[derive(Debug, Clone)]
pub enum PasswordSource {
    /// SHA-256 hex digest of the site password.
    Digest(String),
    /// Plaintext site password (legacy, discouraged).
    Plaintext(String),
}

/// Secrets resolved from the environment.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Secret used to sign and verify tokens.
    pub token_secret: String,
    /// Site credential, if any is configured. `None` surfaces as a
    /// configuration error at login time, not at startup, so verify keeps
    /// working for already-issued tokens.
    pub password_source: Option<PasswordSource>,
}

impl Secrets {
    /// Resolve secrets from the environment.
    ///
    /// The signing secret falls back to the password digest, then the
    /// plaintext password. With none of the three set the boundary cannot
    /// sign anything and refuses to operate.
    pub fn from_env() -> Result<Self, GateError> {
        let digest = non_empty_var(PASSWORD_DIGEST_VAR);
        let plaintext = non_empty_var(PASSWORD_PLAINTEXT_VAR);

        let token_secret = non_empty_var(TOKEN_SECRET_VAR)
            .or_else(|| digest.clone())
            .or_else(|| plaintext.clone())
            .ok_or_else(|| {
                GateError::config(
                    "No token signing secret configured",
                    format!(
                        "Set {} (or {} / {} as a fallback) in the environment",
                        TOKEN_SECRET_VAR, PASSWORD_DIGEST_VAR, PASSWORD_PLAINTEXT_VAR
                    ),
                )
            })?;

        let password_source = match (digest, plaintext) {
            (Some(d), _) => Some(PasswordSource::Digest(d.to_lowercase())),
            (None, Some(p)) => Some(PasswordSource::Plaintext(p)),
            (None, None) => None,
        };

        Ok(Self {
            token_secret,
            password_source,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.security.max_login_attempts, 5);
        assert_eq!(settings.security.lockout_minutes, 15);
        assert_eq!(settings.security.token_ttl_seconds, 86_400);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, "pretty");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.server.bind_addr, default_bind_addr());
        assert!(!settings.server.production);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            bind_addr = "0.0.0.0:8080"
            production = true

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.bind_addr.port(), 8080);
        assert!(settings.server.production);
        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.security.max_login_attempts, 5);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let settings: Settings = toml::from_str(
            r#"
            [logging]
            level = "verbose"
            "#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }
}
