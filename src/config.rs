// Configuration File Support
//
// This module provides configuration file parsing for stockguard.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from the XDG config directory:
// ~/.config/stockguard/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rate_limit::policy::{
    PolicySet, RateLimitPolicy, API_REQUESTS, AUTH_ATTEMPTS, DEFAULT_API_REQUEST_LIMIT,
    DEFAULT_API_REQUEST_WINDOW_SECS, DEFAULT_AUTH_ATTEMPT_LIMIT, DEFAULT_AUTH_ATTEMPT_WINDOW_SECS,
    DEFAULT_PASSWORD_RESET_LIMIT, DEFAULT_PASSWORD_RESET_WINDOW_SECS, PASSWORD_RESET,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Rate limit configuration
    pub rate_limit: RateLimitSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Login attempts per window
    pub auth_attempt_limit: u32,
    /// Login attempt window in seconds
    pub auth_attempt_window_secs: u64,

    /// Password-reset requests per window
    pub password_reset_limit: u32,
    /// Password-reset window in seconds
    pub password_reset_window_secs: u64,

    /// Generic API requests per window
    pub api_request_limit: u32,
    /// Generic API window in seconds
    pub api_request_window_secs: u64,

    /// Bound on a single quota store call before failing open, in milliseconds
    pub store_timeout_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            auth_attempt_limit: DEFAULT_AUTH_ATTEMPT_LIMIT,
            auth_attempt_window_secs: DEFAULT_AUTH_ATTEMPT_WINDOW_SECS,
            password_reset_limit: DEFAULT_PASSWORD_RESET_LIMIT,
            password_reset_window_secs: DEFAULT_PASSWORD_RESET_WINDOW_SECS,
            api_request_limit: DEFAULT_API_REQUEST_LIMIT,
            api_request_window_secs: DEFAULT_API_REQUEST_WINDOW_SECS,
            store_timeout_ms: 2_000,
        }
    }
}

impl RateLimitSettings {
    /// Build the policy registry these settings describe
    pub fn policy_set(&self) -> PolicySet {
        PolicySet::empty()
            .with_policy(
                AUTH_ATTEMPTS,
                RateLimitPolicy::new(self.auth_attempt_limit, self.auth_attempt_window_secs),
            )
            .with_policy(
                PASSWORD_RESET,
                RateLimitPolicy::new(self.password_reset_limit, self.password_reset_window_secs),
            )
            .with_policy(
                API_REQUESTS,
                RateLimitPolicy::new(self.api_request_limit, self.api_request_window_secs),
            )
    }

    /// Store-call time bound as a `Duration`
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// fails validation. A missing file yields defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default().apply_env_overrides());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        let config = config.apply_env_overrides();
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/stockguard/config.toml` on Linux/Mac
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "stockguard", "Stockguard") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("stockguard")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - STOCKGUARD_LOG_LEVEL
    /// - STOCKGUARD_LOG_FORMAT
    /// - STOCKGUARD_PORT
    /// - STOCKGUARD_AUTH_ATTEMPT_LIMIT
    /// - STOCKGUARD_PASSWORD_RESET_LIMIT
    /// - STOCKGUARD_API_REQUEST_LIMIT
    /// - STOCKGUARD_STORE_TIMEOUT_MS
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("STOCKGUARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STOCKGUARD_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(port) = std::env::var("STOCKGUARD_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                if port > 0 {
                    self.server.port = port;
                }
            }
        }

        if let Ok(limit) = std::env::var("STOCKGUARD_AUTH_ATTEMPT_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                if limit > 0 {
                    self.rate_limit.auth_attempt_limit = limit;
                }
            }
        }
        if let Ok(limit) = std::env::var("STOCKGUARD_PASSWORD_RESET_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                if limit > 0 {
                    self.rate_limit.password_reset_limit = limit;
                }
            }
        }
        if let Ok(limit) = std::env::var("STOCKGUARD_API_REQUEST_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                if limit > 0 {
                    self.rate_limit.api_request_limit = limit;
                }
            }
        }
        if let Ok(timeout) = std::env::var("STOCKGUARD_STORE_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.rate_limit.store_timeout_ms = timeout;
                }
            }
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        let limits = [
            ("auth_attempt_limit", self.rate_limit.auth_attempt_limit),
            ("password_reset_limit", self.rate_limit.password_reset_limit),
            ("api_request_limit", self.rate_limit.api_request_limit),
        ];
        for (name, limit) in limits {
            if limit == 0 {
                anyhow::bail!("Rate limit '{}' must be > 0", name);
            }
        }

        let windows = [
            (
                "auth_attempt_window_secs",
                self.rate_limit.auth_attempt_window_secs,
            ),
            (
                "password_reset_window_secs",
                self.rate_limit.password_reset_window_secs,
            ),
            (
                "api_request_window_secs",
                self.rate_limit.api_request_window_secs,
            ),
        ];
        for (name, window) in windows {
            if window == 0 {
                anyhow::bail!("Rate limit window '{}' must be > 0", name);
            }
        }

        if self.rate_limit.store_timeout_ms == 0 {
            anyhow::bail!("Quota store timeout must be > 0");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
