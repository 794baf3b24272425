//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing logic.

use std::path::PathBuf;

use crate::provider::ProviderId;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSection,
    pub osrm: OsrmSettings,
    pub ors: OrsSettings,
    pub directions: DirectionsSettings,
    pub optimizer: OptimizerSettings,
    pub logging: LoggingSettings,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSection {
    /// Provider used when none is selected explicitly
    pub default: ProviderId,
}

/// `[osrm]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsrmSettings {
    /// Service URL override (self-hosted OSRM)
    pub url: Option<String>,
}

/// `[ors]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrsSettings {
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub referrer: Option<String>,
    pub url: Option<String>,
}

/// `[directions]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsSettings {
    /// HTTP timeout in seconds
    pub timeout: u64,
    /// Overrides every provider's own request spacing
    pub min_request_interval_ms: Option<u64>,
    /// Pending requests kept while one is in flight (0 = unbounded)
    pub queue_capacity: usize,
}

/// `[optimizer]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Measure legs with the directions service instead of great-circle distance
    pub road_distances: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
