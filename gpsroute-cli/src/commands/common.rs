//! Common types and utilities shared across CLI commands.

use std::path::Path;

use clap::ValueEnum;
use gpsroute::config::ConfigFile;
use gpsroute::geo::LatLng;
use gpsroute::provider::{ProviderFactory, ProviderId, ProviderRegistry};
use gpsroute::route::VehicleType;
use gpsroute::transport::ReqwestTransport;

use crate::error::CliError;

/// Directions provider selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ProviderArg {
    /// OSRM route service (no API key required)
    Osrm,
    /// openrouteservice (requires an API key)
    Ors,
}

impl From<ProviderArg> for ProviderId {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Osrm => ProviderId::Osrm,
            ProviderArg::Ors => ProviderId::OpenRouteService,
        }
    }
}

/// Vehicle selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum VehicleArg {
    Car,
    Truck,
    Bike,
    Motorbike,
    Pedestrian,
    Campervan,
    Bus,
}

impl From<VehicleArg> for VehicleType {
    fn from(arg: VehicleArg) -> Self {
        match arg {
            VehicleArg::Car => VehicleType::Car,
            VehicleArg::Truck => VehicleType::Truck,
            VehicleArg::Bike => VehicleType::Bike,
            VehicleArg::Motorbike => VehicleType::Motorbike,
            VehicleArg::Pedestrian => VehicleType::Pedestrian,
            VehicleArg::Campervan => VehicleType::Campervan,
            VehicleArg::Bus => VehicleType::Bus,
        }
    }
}

/// Parses a `LAT,LNG` argument.
pub fn parse_point(s: &str) -> Result<LatLng, String> {
    s.parse::<LatLng>().map_err(|e| e.to_string())
}

/// Loads the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Provider factory bound to a registry populated from `config`.
pub fn provider_factory(config: &ConfigFile) -> ProviderFactory {
    let registry = ProviderRegistry::new();
    config.apply_to(&registry);
    ProviderFactory::new(registry)
}

pub fn http_transport(config: &ConfigFile) -> Result<ReqwestTransport, CliError> {
    Ok(ReqwestTransport::with_timeout(config.directions.timeout)?)
}

/// Kilometres with one decimal.
pub fn format_km(metres: f64) -> String {
    format!("{:.1} km", metres / 1000.0)
}

/// Hours and minutes.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as u64;
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
