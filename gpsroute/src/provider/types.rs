//! Provider types and traits

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::geo::LatLng;
use crate::route::{Route, RouteOptions, TravelOptions, VehicleType};
use crate::status::StatusCode;
use crate::transport::{DirectionsRequest, TransportError};

/// Identifies a directions service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    /// Public OSRM demo server or a self-hosted OSRM instance.
    Osrm,
    /// openrouteservice.org (requires an API key).
    OpenRouteService,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Osrm, ProviderId::OpenRouteService];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::Osrm => "osrm",
            ProviderId::OpenRouteService => "ors",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenRouteService)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "osrm" => Ok(ProviderId::Osrm),
            "ors" | "openrouteservice" => Ok(ProviderId::OpenRouteService),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

/// Errors raised while creating providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("provider '{0}' requires an API key")]
    MissingApiKey(ProviderId),

    #[error("invalid service URL '{url}' for provider '{provider}'")]
    InvalidUrl { provider: ProviderId, url: String },
}

/// A directions service.
///
/// Providers are pure request builders and response parsers: they never
/// perform I/O themselves. The fetcher splits waypoints into chunks of at
/// most [`max_waypoints_per_request`](Self::max_waypoints_per_request),
/// asks the provider for a request per chunk, sends it through a
/// transport and hands the body back for parsing.
pub trait DirectionsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Options this provider honors, per vehicle type.
    fn supported_travel_options(&self) -> TravelOptions;

    /// Largest number of waypoints a single request may carry.
    fn max_waypoints_per_request(&self) -> usize;

    /// Minimum spacing between consecutive requests to this service.
    fn min_request_interval(&self) -> Duration {
        Duration::ZERO
    }

    /// Builds the request for one chunk of waypoints.
    fn build_request(
        &self,
        chunk: &[LatLng],
        vehicle: VehicleType,
        options: &RouteOptions,
    ) -> Result<DirectionsRequest, StatusCode>;

    /// Parses a response body into the chunk's route.
    ///
    /// Service-level failures are reported as the matching status.
    fn parse_response(
        &self,
        body: &[u8],
        vehicle: VehicleType,
        options: &RouteOptions,
    ) -> Result<Route, StatusCode>;

    /// Maps a failed exchange to a service-level status.
    ///
    /// Services that report errors through HTTP status codes with a
    /// payload can decode it here; `None` keeps the transport status.
    fn classify_error(&self, _error: &TransportError) -> Option<StatusCode> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parse() {
        assert_eq!("osrm".parse::<ProviderId>().unwrap(), ProviderId::Osrm);
        assert_eq!(
            " ORS ".parse::<ProviderId>().unwrap(),
            ProviderId::OpenRouteService
        );
        assert_eq!(
            "openrouteservice".parse::<ProviderId>().unwrap(),
            ProviderId::OpenRouteService
        );
        assert_eq!(
            "bing".parse::<ProviderId>(),
            Err(ProviderError::UnknownProvider("bing".to_string()))
        );
    }

    #[test]
    fn test_provider_id_names_roundtrip() {
        for id in ProviderId::ALL {
            assert_eq!(id.name().parse::<ProviderId>().unwrap(), id);
        }
        assert!(ProviderId::OpenRouteService.requires_api_key());
        assert!(!ProviderId::Osrm.requires_api_key());
    }
}
