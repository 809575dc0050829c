//! Runtime configuration assembled from environment variables.

use std::path::PathBuf;

use caselink_api::{ApiConfig, ApiError};
use caselink_ui::Locale;
use caselink_upload::DEFAULT_MAX_FILE_SIZE;
use thiserror::Error;

/// Environment variable selecting the UI locale.
pub const LOCALE_ENV: &str = "CASELINK_LOCALE";
/// Environment variable pointing at runtime translation tables.
pub const LOCALES_DIR_ENV: &str = "CASELINK_LOCALES_DIR";
/// Environment variable overriding the per-file upload limit.
pub const MAX_UPLOAD_BYTES_ENV: &str = "CASELINK_MAX_UPLOAD_BYTES";

/// Everything a dashboard session needs besides the link itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// UI locale; unsupported values fall back to English.
    pub locale: Locale,
    /// Directory with `{lng}/{namespace}.json` overrides.
    pub locales_dir: Option<PathBuf>,
    /// Per-file upload limit in bytes.
    pub max_upload_bytes: u64,
}

impl AppConfig {
    /// Reads config from the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads config through `lookup`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Api`] for a missing or invalid backend setting
    /// and [`ConfigError::MaxUploadBytes`] for a non-positive size limit.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api = ApiConfig::from_lookup(&lookup)?;
        let locale = Locale::detect(lookup(LOCALE_ENV).as_deref());
        let locales_dir = lookup(LOCALES_DIR_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let max_upload_bytes = match lookup(MAX_UPLOAD_BYTES_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::MaxUploadBytes(raw))?,
            None => DEFAULT_MAX_FILE_SIZE,
        };

        Ok(Self {
            api,
            locale,
            locales_dir,
            max_upload_bytes,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Backend settings are missing or invalid.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Size limit is not a positive integer.
    #[error("{MAX_UPLOAD_BYTES_ENV} must be a positive integer, got {0:?}")]
    MaxUploadBytes(String),
}
