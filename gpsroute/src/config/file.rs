//! Configuration file handling for ~/.gpsroute/config.ini.
//!
//! The file is read-only from the library's point of view: it is loaded at
//! startup and applied to a [`ProviderRegistry`], never written back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::fetcher::FetcherConfig;
use super::settings::ConfigFile;
use crate::provider::{ProviderId, ProviderRegistry};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.gpsroute/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Registers provider settings and the default provider.
    ///
    /// Only values present in the file are written; existing registry
    /// entries keep their other fields.
    pub fn apply_to(&self, registry: &ProviderRegistry) {
        let osrm_url = self.osrm.url.clone();
        registry.update_or_create(ProviderId::Osrm, |settings| {
            if osrm_url.is_some() {
                settings.base_url = osrm_url;
            }
        });

        let ors = self.ors.clone();
        registry.update_or_create(ProviderId::OpenRouteService, |settings| {
            if ors.api_key.is_some() {
                settings.api_key = ors.api_key;
            }
            if ors.language.is_some() {
                settings.language = ors.language;
            }
            if ors.referrer.is_some() {
                settings.referrer = ors.referrer;
            }
            if ors.url.is_some() {
                settings.base_url = ors.url;
            }
        });

        registry.set_default_or_create(self.provider.default);
    }

    /// Fetcher configuration from the `[directions]` section.
    pub fn fetcher_config(&self) -> FetcherConfig {
        let config = FetcherConfig::new()
            .with_timeout_secs(self.directions.timeout)
            .with_queue_capacity(self.directions.queue_capacity);
        match self.directions.min_request_interval_ms {
            Some(ms) => config.with_min_request_interval(Duration::from_millis(ms)),
            None => config,
        }
    }
}

/// Get the path to the config directory (~/.gpsroute).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gpsroute")
}

/// Get the path to the config file (~/.gpsroute/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
