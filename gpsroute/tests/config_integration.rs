//! Integration tests for loading config.ini and applying it.

use std::time::Duration;

use gpsroute::config::{ConfigFile, ConfigFileError};
use gpsroute::provider::{ProviderFactory, ProviderId, ProviderRegistry};
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.ini");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_config_selects_and_configures_ors() {
    let (_dir, path) = write_config(
        "[provider]\ndefault = ors\n\n[ors]\napi_key = abc\nlanguage = fr\n\n[directions]\nmin_request_interval_ms = 0\nqueue_capacity = 0\n",
    );
    let config = ConfigFile::load_from(&path).unwrap();

    let registry = ProviderRegistry::new();
    config.apply_to(&registry);
    let provider = ProviderFactory::new(registry).create_default().unwrap();
    assert_eq!(provider.id(), ProviderId::OpenRouteService);

    let fetcher = config.fetcher_config();
    assert_eq!(fetcher.min_request_interval(), Some(Duration::ZERO));
    assert_eq!(fetcher.queue_capacity(), 0);
}

#[test]
fn test_ors_default_without_key_fails_at_creation() {
    let (_dir, path) = write_config("[provider]\ndefault = ors\n");
    let config = ConfigFile::load_from(&path).unwrap();

    let registry = ProviderRegistry::new();
    config.apply_to(&registry);
    assert!(ProviderFactory::new(registry).create_default().is_err());
}

#[test]
fn test_invalid_value_names_section_and_key() {
    let (_dir, path) = write_config("[directions]\nqueue_capacity = many\n");
    match ConfigFile::load_from(&path) {
        Err(ConfigFileError::InvalidValue { section, key, .. }) => {
            assert_eq!(section, "directions");
            assert_eq!(key, "queue_capacity");
        }
        other => panic!("expected InvalidValue, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_logging_directory_expands_tilde() {
    let (_dir, path) = write_config("[logging]\ndirectory = ~/gpsroute-logs\n");
    let config = ConfigFile::load_from(&path).unwrap();
    if let Some(home) = dirs::home_dir() {
        assert_eq!(config.logging.directory, home.join("gpsroute-logs"));
    }
}
