//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use gpsroute::config::ConfigFileError;
use gpsroute::provider::{ProviderError, ProviderId};
use gpsroute::status::StatusCode;
use gpsroute::transport::TransportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Provider could not be created
    Provider(ProviderError),
    /// HTTP client could not be created
    Transport(TransportError),
    /// Tokio runtime could not be started
    Runtime(std::io::Error),
    /// Bad command-line input
    InvalidArgument(String),
    /// Directions request finished without a route
    Directions(StatusCode),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Provider(ProviderError::MissingApiKey(ProviderId::OpenRouteService)) => {
                eprintln!();
                eprintln!("openrouteservice needs an API key. Add it to config.ini:");
                eprintln!("  [ors]");
                eprintln!("  api_key = <your key>");
            }
            CliError::Directions(StatusCode::OverQueryLimit) => {
                eprintln!();
                eprintln!("The provider's request quota is exhausted; try again later");
                eprintln!("or raise [directions] min_request_interval_ms.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Provider(e) => write!(f, "Provider error: {}", e),
            CliError::Transport(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Directions(status) => write!(f, "Directions request failed: {}", status),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Transport(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}
