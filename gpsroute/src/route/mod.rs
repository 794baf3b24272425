//! Route model and merge algebra.
//!
//! A [`Route`] is what a provider returns for one chunk of waypoints.
//! Routes for consecutive chunks are concatenated with `+=`:
//!
//! ```text
//!   steps      appended in order
//!   polyline   appended, shared boundary point dropped
//!   locations  appended, shared boundary location dropped
//!   summary    distance and duration summed, validity AND-ed
//!   vehicle    kept when equal, otherwise Default
//!   options    merged (see [`options`])
//! ```

pub mod options;

use std::ops::{Add, AddAssign};

use crate::geo::{Location, Locations, Polyline};

pub use options::{
    AcceptedRoadOptions, AcceptedRouteOptions, CommonOptions, Degree, ItineraryType,
    OptionDetails, OptionsKind, Parameter, PedestrianOptions, RoadOptions, RouteOptions,
    ThrillingOptions, TravelOptions, TruckCategory, TruckOptions, VehicleType,
};

/// Distance (meters) and duration (seconds) of a route or step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    distance: f64,
    duration: f64,
    valid: bool,
}

impl Default for Summary {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Summary {
    pub fn new(distance: f64, duration: f64) -> Self {
        Self {
            distance,
            duration,
            valid: true,
        }
    }

    /// A summary whose values are unknown.
    pub fn invalid() -> Self {
        Self {
            distance: 0.0,
            duration: 0.0,
            valid: false,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Summary) {
        self.distance += other.distance;
        self.duration += other.duration;
        self.valid &= other.valid;
    }
}

impl Add for Summary {
    type Output = Summary;

    fn add(mut self, other: Summary) -> Summary {
        self += other;
        self
    }
}

/// One maneuver of a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub location: Location,
    pub summary: Summary,
    pub instructions: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub steps: Vec<Step>,
    pub polyline: Polyline,
    pub summary: Summary,
    pub locations: Locations,
    pub options: RouteOptions,
    pub vehicle: VehicleType,
}

impl Route {
    pub fn new(vehicle: VehicleType, options: RouteOptions) -> Self {
        Self {
            vehicle,
            options,
            ..Self::default()
        }
    }

    /// Resets every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.polyline.is_empty() && self.locations.is_empty()
    }
}

impl AddAssign<&Route> for Route {
    fn add_assign(&mut self, other: &Route) {
        self.steps.extend(other.steps.iter().cloned());
        self.summary += other.summary;
        self.polyline += &other.polyline;
        self.locations += &other.locations;
        if self.vehicle != other.vehicle {
            self.vehicle = VehicleType::Default;
        }
        self.options.merge(&other.options);
    }
}

impl AddAssign<Route> for Route {
    fn add_assign(&mut self, other: Route) {
        *self += &other;
    }
}

impl Add<&Route> for Route {
    type Output = Route;

    fn add(mut self, other: &Route) -> Route {
        self += other;
        self
    }
}

impl Add for Route {
    type Output = Route;

    fn add(mut self, other: Route) -> Route {
        self += &other;
        self
    }
}

/// Folds a chunk's route into the accumulated list.
///
/// Linked requests keep a single route; unlinked ones keep one per chunk.
pub fn accumulate(routes: &mut Vec<Route>, route: Route, linked: bool) {
    match routes.first_mut() {
        Some(first) if linked => *first += &route,
        _ => routes.push(route),
    }
}
