//! Configuration file parser for ~/.config/listing-sync/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`. Unknown keys are accepted but logged as warnings,
//! since they are usually typos.
use crate::util::validate_base_url;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `api_token` from the file.
pub const API_TOKEN_ENV: &str = "LISTINGS_API_TOKEN";

pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Parsed fine but a value is out of range.
    #[error("Invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The custom Debug impl masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the listing API. HTTPS unless it points at localhost.
    pub api_base_url: String,

    /// Listings per plain-feed page (1..=100).
    pub page_size: u32,

    /// User the favorite toggles are issued for.
    pub user_id: String,

    pub request_timeout_secs: u64,

    pub max_response_bytes: usize,

    /// Bearer token. `LISTINGS_API_TOKEN` takes precedence.
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/".to_string(),
            page_size: 10,
            user_id: String::new(),
            request_timeout_secs: 20,
            max_response_bytes: 5 * 1024 * 1024,
            api_token: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("page_size", &self.page_size)
            .field("user_id", &self.user_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_base_url",
        "page_size",
        "user_id",
        "request_timeout_secs",
        "max_response_bytes",
        "api_token",
    ];

    /// Load and validate configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range value → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file is never pulled into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: format!("{} is outside 1..={}", self.page_size, MAX_PAGE_SIZE),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_response_bytes",
                reason: "must be positive".to_string(),
            });
        }
        validate_base_url(&self.api_base_url).map_err(|e| ConfigError::Invalid {
            key: "api_base_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Effective API token: env var first, then the file.
    pub fn api_token(&self) -> Option<SecretString> {
        Self::resolve_token(std::env::var(API_TOKEN_ENV).ok(), self.api_token.as_deref())
    }

    fn resolve_token(env: Option<String>, file: Option<&str>) -> Option<SecretString> {
        env.filter(|t| !t.trim().is_empty())
            .or_else(|| file.filter(|t| !t.trim().is_empty()).map(str::to_string))
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
