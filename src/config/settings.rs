//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use crate::dispatcher::{CredentialPool, PoolError, CREDENTIAL_SLOTS};
use crate::services::gemini::GEMINI_API_BASE;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => anyhow::bail!("Invalid log format: {}. Expected: json or pretty", s),
        }
    }
}

/// Gemini client configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeminiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: GEMINI_API_BASE.to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Credential dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchSettings {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub failure_threshold: u32,
    pub reset_interval_secs: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 5000,
            failure_threshold: 5,
            reset_interval_secs: 3600,
        }
    }
}

/// One credential configuration slot
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialSlot {
    pub name: String,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
}

impl CredentialSlot {
    pub fn is_configured(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("name", &self.name)
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,
    pub log_format: LogFormat,

    // Server settings
    pub host: String,
    pub port: u16,

    // Provider
    pub gemini: GeminiSettings,

    // Dispatcher
    pub dispatch: DispatchSettings,

    // Credentials, in pool order
    pub credentials: Vec<CredentialSlot>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let settings = Self {
            // App settings
            app_name: var_or("APP_NAME", "image-studio"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: var_or("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: var_or("LOG_LEVEL", "info"),
            log_format: var_or("LOG_FORMAT", "json").parse().unwrap_or_default(),

            // Server settings
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            // Provider
            gemini: GeminiSettings {
                base_url: var_or("GEMINI_BASE_URL", GEMINI_API_BASE),
                timeout_seconds: var_or("GEMINI_TIMEOUT_SECONDS", "120")
                    .parse()
                    .context("Invalid GEMINI_TIMEOUT_SECONDS value")?,
            },

            // Dispatcher
            dispatch: DispatchSettings {
                max_attempts: var_or("DISPATCH_MAX_ATTEMPTS", "3")
                    .parse()
                    .context("Invalid DISPATCH_MAX_ATTEMPTS value")?,
                backoff_base_ms: var_or("DISPATCH_BACKOFF_BASE_MS", "1000")
                    .parse()
                    .context("Invalid DISPATCH_BACKOFF_BASE_MS value")?,
                backoff_max_ms: var_or("DISPATCH_BACKOFF_MAX_MS", "5000")
                    .parse()
                    .context("Invalid DISPATCH_BACKOFF_MAX_MS value")?,
                failure_threshold: var_or("DISPATCH_FAILURE_THRESHOLD", "5")
                    .parse()
                    .context("Invalid DISPATCH_FAILURE_THRESHOLD value")?,
                reset_interval_secs: var_or("DISPATCH_RESET_INTERVAL_SECS", "3600")
                    .parse()
                    .context("Invalid DISPATCH_RESET_INTERVAL_SECS value")?,
            },

            // Credentials
            credentials: CREDENTIAL_SLOTS
                .iter()
                .map(|slot| CredentialSlot {
                    name: slot.to_string(),
                    secret: lookup(slot),
                })
                .collect(),
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.gemini.timeout_seconds == 0 {
            anyhow::bail!("GEMINI_TIMEOUT_SECONDS must be > 0");
        }

        if self.dispatch.max_attempts == 0 {
            anyhow::bail!("DISPATCH_MAX_ATTEMPTS must be > 0");
        }
        if self.dispatch.failure_threshold == 0 {
            anyhow::bail!("DISPATCH_FAILURE_THRESHOLD must be > 0");
        }
        if self.dispatch.reset_interval_secs == 0 {
            anyhow::bail!("DISPATCH_RESET_INTERVAL_SECS must be > 0");
        }
        if self.dispatch.backoff_base_ms > self.dispatch.backoff_max_ms {
            anyhow::bail!("DISPATCH_BACKOFF_BASE_MS must not exceed DISPATCH_BACKOFF_MAX_MS");
        }

        if !self.credentials.iter().any(CredentialSlot::is_configured) {
            tracing::warn!("No GEMINI_API_KEY credentials configured");
        }

        Ok(())
    }

    /// Build the credential pool from the configured slots
    pub fn credential_pool(&self) -> Result<CredentialPool, PoolError> {
        CredentialPool::from_slots(
            self.credentials
                .iter()
                .map(|slot| (slot.name.as_str(), slot.secret.as_deref())),
        )
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "image-studio".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            host: "0.0.0.0".to_string(),
            port: 8000,
            gemini: GeminiSettings::default(),
            dispatch: DispatchSettings::default(),
            credentials: CREDENTIAL_SLOTS
                .iter()
                .map(|slot| CredentialSlot {
                    name: slot.to_string(),
                    secret: None,
                })
                .collect(),
        }
    }
}
