//! openrouteservice directions provider.
//!
//! ```text
//! POST {base}/v2/directions/{profile}
//! Authorization: {api key}
//! {"coordinates": [[lng, lat], ...], "preference": ..., "language": ..., "options": {...}}
//! ```
//!
//! Failures come back with a 4xx status and an error payload
//! `{"error": {"code": 2010, "message": "..."}}`, which is decoded by
//! [`DirectionsProvider::classify_error`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::registry::ProviderRegistry;
use super::types::{DirectionsProvider, ProviderId};
use crate::geo::{LatLng, Location, Locations, Polyline, DEFAULT_POLYLINE_PRECISION};
use crate::route::{
    AcceptedRoadOptions, AcceptedRouteOptions, ItineraryType, OptionsKind, Parameter, Route,
    RouteOptions, Step, Summary, TravelOptions, VehicleType,
};
use crate::status::StatusCode;
use crate::transport::{DirectionsRequest, TransportError};

pub const ORS_DEFAULT_URL: &str = "https://api.openrouteservice.org";

/// Waypoints per request on the standard plan.
pub const ORS_MAX_WAYPOINTS: usize = 50;

/// Free plan allows 40 directions requests per minute.
pub const ORS_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1500);

const ERROR_INVALID_JSON: i64 = 2000;
const ERROR_INVALID_PARAMETER_VALUE: i64 = 2003;
const ERROR_PARAMETER_OUT_OF_RANGE: i64 = 2004;
const ERROR_POINT_NOT_FOUND: i64 = 2010;
const ERROR_ROUTE_NOT_FOUND: i64 = 2009;

#[derive(Debug, Serialize)]
struct OrsRequestBody {
    coordinates: Vec<[f64; 2]>,
    preference: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OrsRequestOptions>,
}

#[derive(Debug, Serialize)]
struct OrsRequestOptions {
    avoid_features: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct OrsResponse {
    #[serde(default)]
    routes: Vec<OrsRoute>,
    #[serde(default)]
    error: Option<OrsError>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrsError {
    Detailed { code: i64, message: Option<String> },
    Message(String),
}

#[derive(Debug, Deserialize)]
struct OrsRoute {
    summary: OrsSummary,
    geometry: String,
    #[serde(default)]
    segments: Vec<OrsSegment>,
    #[serde(default)]
    way_points: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OrsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OrsSegment {
    #[serde(default)]
    steps: Vec<OrsStep>,
}

#[derive(Debug, Deserialize)]
struct OrsStep {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    way_points: Vec<usize>,
}

/// Directions from openrouteservice.
///
/// The API key, language, referrer and service URL are read from the
/// registry on every request.
pub struct OrsProvider {
    registry: ProviderRegistry,
}

impl OrsProvider {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    fn profile(vehicle: VehicleType) -> &'static str {
        match vehicle {
            VehicleType::Truck => "driving-hgv",
            VehicleType::Bike => "cycling-regular",
            VehicleType::Pedestrian => "foot-walking",
            _ => "driving-car",
        }
    }

    fn preference(options: &RouteOptions) -> &'static str {
        match options.common.itinerary {
            ItineraryType::Shortest => "shortest",
            ItineraryType::Quickest => "fastest",
            _ => "recommended",
        }
    }

    fn avoid_features(options: &RouteOptions) -> Vec<&'static str> {
        let Some(road) = options.road_options() else {
            return Vec::new();
        };
        let mut avoid = Vec::new();
        if !road.highways {
            avoid.push("highways");
        }
        if !road.tolls {
            avoid.push("tollways");
        }
        if !road.boat_ferries {
            avoid.push("ferries");
        }
        avoid
    }
}

fn status_for_error_code(code: i64) -> StatusCode {
    match code {
        ERROR_PARAMETER_OUT_OF_RANGE => StatusCode::MaxWaypointsExceeded,
        ERROR_ROUTE_NOT_FOUND | ERROR_POINT_NOT_FOUND => StatusCode::NotFound,
        ERROR_INVALID_JSON..=ERROR_INVALID_PARAMETER_VALUE => StatusCode::InvalidRequest,
        _ => StatusCode::UnknownError,
    }
}

fn status_for_error(error: &OrsError) -> StatusCode {
    match error {
        OrsError::Detailed { code, message } => {
            debug!(
                code = code,
                message = message.as_deref().unwrap_or(""),
                "openrouteservice reported failure"
            );
            status_for_error_code(*code)
        }
        OrsError::Message(message) if message.to_lowercase().contains("quota") => {
            StatusCode::OverQueryLimit
        }
        OrsError::Message(message) => {
            debug!(message = %message, "openrouteservice reported failure");
            StatusCode::RequestDenied
        }
    }
}

fn point_at(polyline: &Polyline, index: Option<&usize>) -> LatLng {
    index
        .and_then(|&i| polyline.path().get(i))
        .copied()
        .unwrap_or_default()
}

impl DirectionsProvider for OrsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenRouteService
    }

    fn supported_travel_options(&self) -> TravelOptions {
        let mut road = AcceptedRoadOptions::fixed();
        road.highways = Parameter::new(true, true);
        road.tolls = Parameter::new(true, true);
        road.boat_ferries = Parameter::new(true, true);

        let mut car = AcceptedRouteOptions::basic(OptionsKind::Road).with_road(road);
        car.itineraries = Parameter::new(
            BTreeSet::from([ItineraryType::Quickest, ItineraryType::Shortest]),
            ItineraryType::Quickest,
        );

        BTreeMap::from([
            (VehicleType::Car, car),
            (
                VehicleType::Truck,
                AcceptedRouteOptions::basic_road(OptionsKind::Truck),
            ),
            (VehicleType::Bike, AcceptedRouteOptions::basic(OptionsKind::Bike)),
            (
                VehicleType::Pedestrian,
                AcceptedRouteOptions::basic(OptionsKind::Pedestrian),
            ),
        ])
    }

    fn max_waypoints_per_request(&self) -> usize {
        ORS_MAX_WAYPOINTS
    }

    fn min_request_interval(&self) -> Duration {
        ORS_MIN_REQUEST_INTERVAL
    }

    fn build_request(
        &self,
        chunk: &[LatLng],
        vehicle: VehicleType,
        options: &RouteOptions,
    ) -> Result<DirectionsRequest, StatusCode> {
        let settings = self
            .registry
            .get(ProviderId::OpenRouteService)
            .unwrap_or_default();
        let api_key = settings
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or(StatusCode::RequestDenied)?;

        let avoid_features = Self::avoid_features(options);
        let body = OrsRequestBody {
            coordinates: chunk.iter().map(|p| [p.lng, p.lat]).collect(),
            preference: Self::preference(options),
            language: settings.language.filter(|l| !l.is_empty()),
            options: (!avoid_features.is_empty()).then_some(OrsRequestOptions { avoid_features }),
        };
        let body = serde_json::to_string(&body).map_err(|_| StatusCode::InvalidRequest)?;

        let base = settings
            .base_url
            .unwrap_or_else(|| ORS_DEFAULT_URL.to_string());
        let url = format!(
            "{}/v2/directions/{}",
            base.trim_end_matches('/'),
            Self::profile(vehicle)
        );

        Ok(DirectionsRequest::post(url, body)
            .with_header("Authorization", api_key)
            .with_header("Accept", "application/json")
            .with_referrer(settings.referrer))
    }

    fn parse_response(
        &self,
        body: &[u8],
        vehicle: VehicleType,
        options: &RouteOptions,
    ) -> Result<Route, StatusCode> {
        let response: OrsResponse = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "malformed openrouteservice response");
            StatusCode::InvalidRequest
        })?;

        if let Some(error) = &response.error {
            return Err(status_for_error(error));
        }

        let ors_route = response.routes.first().ok_or(StatusCode::ZeroResults)?;

        let mut route = Route::new(vehicle, *options);
        route.summary = Summary::new(ors_route.summary.distance, ors_route.summary.duration);
        route.polyline = Polyline::from_encoded(&ors_route.geometry, DEFAULT_POLYLINE_PRECISION)
            .map_err(|e| {
                debug!(error = %e, "undecodable openrouteservice geometry");
                StatusCode::InvalidRequest
            })?;

        route.steps = ors_route
            .segments
            .iter()
            .flat_map(|segment| segment.steps.iter())
            .map(|step| Step {
                location: Location::new(
                    point_at(&route.polyline, step.way_points.first()),
                    step.name.clone(),
                ),
                summary: Summary::new(step.distance, step.duration),
                instructions: step.instruction.clone(),
            })
            .collect();

        route.locations = Locations::from(
            ors_route
                .way_points
                .iter()
                .map(|i| Location::from(point_at(&route.polyline, Some(i))))
                .collect::<Vec<_>>(),
        );

        if route.locations.len() < 2 {
            return Err(StatusCode::ZeroResults);
        }

        Ok(route)
    }

    fn classify_error(&self, error: &TransportError) -> Option<StatusCode> {
        if error.code == 429 {
            return Some(StatusCode::OverQueryLimit);
        }
        let body = error.body.as_deref()?;
        let response: OrsResponse = serde_json::from_slice(body).ok()?;
        let status = response.error.as_ref().map(status_for_error)?;
        match (error.code, status) {
            (401 | 403, StatusCode::UnknownError) => Some(StatusCode::RequestDenied),
            (_, status) => Some(status),
        }
    }
}
