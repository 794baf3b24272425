//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::provider::ProviderId;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("default") {
            config.provider.default =
                v.parse::<ProviderId>()
                    .map_err(|_| ConfigFileError::InvalidValue {
                        section: "provider".to_string(),
                        key: "default".to_string(),
                        value: v.to_string(),
                        reason: "must be one of: osrm, ors".to_string(),
                    })?;
        }
    }

    // [osrm] section
    if let Some(section) = ini.section(Some("osrm")) {
        config.osrm.url = parse_url(section, "osrm", "url")?;
    }

    // [ors] section
    if let Some(section) = ini.section(Some("ors")) {
        config.ors.api_key = non_empty(section, "api_key");
        config.ors.language = non_empty(section, "language");
        config.ors.referrer = non_empty(section, "referrer");
        config.ors.url = parse_url(section, "ors", "url")?;
    }

    // [directions] section
    if let Some(section) = ini.section(Some("directions")) {
        if let Some(v) = section.get("timeout") {
            let timeout: u64 = v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "directions".to_string(),
                key: "timeout".to_string(),
                value: v.to_string(),
                reason: "must be a positive number of seconds".to_string(),
            })?;
            if timeout == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "directions".to_string(),
                    key: "timeout".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive number of seconds".to_string(),
                });
            }
            config.directions.timeout = timeout;
        }
        if let Some(v) = section.get("min_request_interval_ms") {
            config.directions.min_request_interval_ms =
                Some(v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "directions".to_string(),
                    key: "min_request_interval_ms".to_string(),
                    value: v.to_string(),
                    reason: "must be a number of milliseconds".to_string(),
                })?);
        }
        if let Some(v) = section.get("queue_capacity") {
            config.directions.queue_capacity =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "directions".to_string(),
                    key: "queue_capacity".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (0 = unbounded)".to_string(),
                })?;
        }
    }

    // [optimizer] section
    if let Some(section) = ini.section(Some("optimizer")) {
        if let Some(v) = section.get("road_distances") {
            config.optimizer.road_distances =
                parse_bool(v).ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "optimizer".to_string(),
                    key: "road_distances".to_string(),
                    value: v.to_string(),
                    reason: "must be true or false".to_string(),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v;
        }
    }

    Ok(config)
}

fn non_empty(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_url(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<String>, ConfigFileError> {
    match non_empty(section, key) {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(Some(url)),
        Some(url) => Err(ConfigFileError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: url,
            reason: "must be an http:// or https:// URL".to_string(),
        }),
        None => Ok(None),
    }
}

/// Parse a boolean value (true/false, yes/no, on/off, 1/0).
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
