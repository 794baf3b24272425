//! Configuration for gpsroute.
//!
//! - [`ConfigFile`] - settings loaded from `~/.gpsroute/config.ini`
//! - [`FetcherConfig`] - runtime options for directions fetchers
//!
//! # Example
//!
//! ```
//! use gpsroute::config::{ConfigFile, FetcherConfig};
//! use gpsroute::provider::ProviderRegistry;
//!
//! let config = ConfigFile::default();
//! let registry = ProviderRegistry::new();
//! config.apply_to(&registry);
//!
//! let fetcher_config: FetcherConfig = config.fetcher_config();
//! assert_eq!(fetcher_config.queue_capacity(), 1);
//! ```

mod defaults;
mod fetcher;
mod file;
mod parser;
mod settings;

pub use defaults::*;
pub use fetcher::FetcherConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
