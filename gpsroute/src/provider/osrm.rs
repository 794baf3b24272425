//! OSRM directions provider.
//!
//! Uses the `route` service of the OSRM HTTP API:
//!
//! ```text
//! GET {base}/route/v1/driving/{lng},{lat};{lng},{lat}...?overview=full&steps=true
//! ```
//!
//! The geometry is a precision-5 encoded polyline. Waypoints come back
//! snapped to the road network with the name of the street they sit on.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::registry::ProviderRegistry;
use super::types::{DirectionsProvider, ProviderId};
use crate::geo::{LatLng, Location, Locations, Polyline, DEFAULT_POLYLINE_PRECISION};
use crate::route::{
    AcceptedRouteOptions, OptionsKind, Route, RouteOptions, Step, Summary, TravelOptions,
    VehicleType,
};
use crate::status::StatusCode;
use crate::transport::{DirectionsRequest, TransportError};

/// Public OSRM demo server.
pub const OSRM_DEFAULT_URL: &str = "http://router.project-osrm.org";

/// Waypoints per OSRM request.
pub const OSRM_MAX_WAYPOINTS: usize = 25;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
    #[serde(default)]
    waypoints: Vec<OsrmWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    location: [f64; 2],
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsrmWaypoint {
    location: [f64; 2],
    #[serde(default)]
    name: String,
}

/// Directions from an OSRM server.
///
/// The service URL is read from the registry on every request so that
/// configuration changes apply to the next chunk.
pub struct OsrmProvider {
    registry: ProviderRegistry,
}

impl OsrmProvider {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    fn base_url(&self) -> String {
        self.registry
            .get(ProviderId::Osrm)
            .ok()
            .and_then(|settings| settings.base_url)
            .unwrap_or_else(|| OSRM_DEFAULT_URL.to_string())
    }
}

fn instruction(maneuver: &OsrmManeuver, name: &str) -> String {
    let mut text = maneuver.kind.clone();
    if let Some(modifier) = &maneuver.modifier {
        text.push(' ');
        text.push_str(modifier);
    }
    if !name.is_empty() {
        text.push_str(" onto ");
        text.push_str(name);
    }
    text
}

fn to_latlng(location: [f64; 2]) -> LatLng {
    LatLng::new(location[1], location[0])
}

impl DirectionsProvider for OsrmProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Osrm
    }

    fn supported_travel_options(&self) -> TravelOptions {
        BTreeMap::from([(
            VehicleType::Car,
            AcceptedRouteOptions::basic_road(OptionsKind::Road),
        )])
    }

    fn max_waypoints_per_request(&self) -> usize {
        OSRM_MAX_WAYPOINTS
    }

    fn build_request(
        &self,
        chunk: &[LatLng],
        _vehicle: VehicleType,
        _options: &RouteOptions,
    ) -> Result<DirectionsRequest, StatusCode> {
        let coordinates: Vec<String> = chunk
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect();

        let url = format!(
            "{}/route/v1/driving/{}?overview=full&steps=true",
            self.base_url().trim_end_matches('/'),
            coordinates.join(";")
        );
        Ok(DirectionsRequest::get(url))
    }

    fn parse_response(
        &self,
        body: &[u8],
        vehicle: VehicleType,
        options: &RouteOptions,
    ) -> Result<Route, StatusCode> {
        let response: OsrmResponse = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "malformed OSRM response");
            StatusCode::InvalidRequest
        })?;

        if response.code != "Ok" {
            debug!(
                code = %response.code,
                message = response.message.as_deref().unwrap_or(""),
                "OSRM reported failure"
            );
            return Err(StatusCode::NotFound);
        }

        let osrm_route = response.routes.first().ok_or(StatusCode::ZeroResults)?;

        let mut route = Route::new(vehicle, *options);
        route.summary = Summary::new(osrm_route.distance, osrm_route.duration);
        route.polyline = Polyline::from_encoded(&osrm_route.geometry, DEFAULT_POLYLINE_PRECISION)
            .map_err(|e| {
                debug!(error = %e, "undecodable OSRM geometry");
                StatusCode::InvalidRequest
            })?;

        route.steps = osrm_route
            .legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .map(|step| Step {
                location: Location::new(to_latlng(step.maneuver.location), step.name.clone()),
                summary: Summary::new(step.distance, step.duration),
                instructions: instruction(&step.maneuver, &step.name),
            })
            .collect();

        route.locations = Locations::from(
            response
                .waypoints
                .iter()
                .map(|w| Location::new(to_latlng(w.location), w.name.clone()))
                .collect::<Vec<_>>(),
        );

        if route.locations.len() < 2 {
            return Err(StatusCode::ZeroResults);
        }

        Ok(route)
    }

    fn classify_error(&self, error: &TransportError) -> Option<StatusCode> {
        let body = error.body.as_deref()?;
        let response: OsrmResponse = serde_json::from_slice(body).ok()?;
        (response.code != "Ok").then_some(StatusCode::NotFound)
    }
}
