//! Default values for configuration settings and `ConfigFile::default()`.

use super::settings::*;
use crate::provider::ProviderId;

/// Provider used when `[provider] default` is not set.
pub const DEFAULT_PROVIDER: ProviderId = ProviderId::Osrm;

/// HTTP timeout for directions requests, in seconds.
pub const DEFAULT_DIRECTIONS_TIMEOUT_SECS: u64 = crate::transport::DEFAULT_TRANSPORT_TIMEOUT_SECS;

/// Pending requests kept by the single-flight queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "gpsroute.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            provider: ProviderSection {
                default: DEFAULT_PROVIDER,
            },
            osrm: OsrmSettings::default(),
            ors: OrsSettings::default(),
            directions: DirectionsSettings {
                timeout: DEFAULT_DIRECTIONS_TIMEOUT_SECS,
                min_request_interval_ms: None,
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
            },
            optimizer: OptimizerSettings {
                road_distances: false,
            },
            logging: LoggingSettings {
                directory: super::file::config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
