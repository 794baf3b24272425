//! 2-opt route optimizer.
//!
//! Reorders the interior points of a route to shorten it, keeping the first
//! and last point fixed. Distances come from a pluggable [`DistanceMetric`]
//! and are computed at most once per pair.

use std::time::Duration;

use tracing::{debug, warn};

use crate::directions::DirectionsFetcher;
use crate::geo::LatLng;
use crate::route::{RouteOptions, VehicleType};
use crate::status::StatusCode;
use crate::transport::DirectionsTransport;

/// Distance between two points, in metres.
pub trait DistanceMetric {
    fn distance(&self, from: &LatLng, to: &LatLng) -> f64;
}

/// Great-circle distance; no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricDistance;

impl DistanceMetric for GeometricDistance {
    fn distance(&self, from: &LatLng, to: &LatLng) -> f64 {
        from.distance_to(to)
    }
}

/// Road distance measured through a directions fetcher.
///
/// Each pair costs one blocking load, so this must not be used from the
/// fetcher's runtime worker threads. A failed load counts as a distance of
/// zero, which can pull the failing leg forward in the tour.
pub struct RoadDistance<T: DirectionsTransport> {
    fetcher: DirectionsFetcher<T>,
    vehicle: VehicleType,
    options: RouteOptions,
    timeout: Option<Duration>,
}

impl<T: DirectionsTransport> RoadDistance<T> {
    pub fn new(fetcher: DirectionsFetcher<T>) -> Self {
        Self {
            fetcher,
            vehicle: VehicleType::Car,
            options: RouteOptions::road(),
            timeout: None,
        }
    }

    pub fn with_vehicle(mut self, vehicle: VehicleType) -> Self {
        self.vehicle = vehicle;
        self
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }

    /// Bounds each pair's wait. Default: wait indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<T: DirectionsTransport> DistanceMetric for RoadDistance<T> {
    fn distance(&self, from: &LatLng, to: &LatLng) -> f64 {
        self.fetcher
            .load_between(*from, *to, self.vehicle, &self.options);
        let status = self.fetcher.get_status(self.timeout);
        if status != StatusCode::Ok {
            if status == StatusCode::Timeout {
                self.fetcher.cancel();
            }
            warn!(from = %from, to = %to, status = %status, "road distance unavailable, using 0");
            return 0.0;
        }
        self.fetcher
            .routes()
            .first()
            .map_or(0.0, |route| route.summary.distance())
    }
}

/// 2-opt optimizer over a fixed set of points.
pub struct RouteOptimizer<M: DistanceMetric> {
    points: Vec<LatLng>,
    metric: M,
    /// Row-major upper triangle cache; `None` until first use.
    matrix: Vec<Option<f64>>,
}

impl<M: DistanceMetric> RouteOptimizer<M> {
    pub fn new(points: Vec<LatLng>, metric: M) -> Self {
        let n = points.len();
        Self {
            points,
            metric,
            matrix: vec![None; n * n],
        }
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distance between points `i` and `j`, computed on first use.
    pub fn distance(&mut self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        let cell = a * self.points.len() + b;
        if let Some(d) = self.matrix[cell] {
            return d;
        }
        let d = self.metric.distance(&self.points[a], &self.points[b]);
        self.matrix[cell] = Some(d);
        d
    }

    /// Length of the tour visiting points in `order`.
    pub fn cumulative_distance(&mut self, order: &[usize]) -> f64 {
        order
            .windows(2)
            .map(|leg| self.distance(leg[0], leg[1]))
            .sum()
    }

    /// Returns the visiting order found by 2-opt.
    ///
    /// The first and last points stay in place. With fewer than four points
    /// there is nothing to swap and the identity order is returned.
    pub fn optimize(&mut self) -> Vec<usize> {
        let n = self.points.len();
        let mut order: Vec<usize> = (0..n).collect();
        if n < 4 {
            return order;
        }

        let mut best = self.cumulative_distance(&order);
        let initial = best;
        let mut passes = 0;
        loop {
            passes += 1;
            let mut improved = false;
            for i in 1..n - 2 {
                for j in i + 1..n - 1 {
                    order[i..=j].reverse();
                    let total = self.cumulative_distance(&order);
                    if total < best {
                        best = total;
                        improved = true;
                    } else {
                        order[i..=j].reverse();
                    }
                }
            }
            if !improved {
                break;
            }
        }

        debug!(
            points = n,
            passes = passes,
            initial = initial,
            optimized = best,
            "2-opt finished"
        );
        order
    }

    /// The points in optimized order.
    pub fn optimize_points(&mut self) -> Vec<LatLng> {
        self.optimize()
            .into_iter()
            .map(|i| self.points[i])
            .collect()
    }
}
