//! gpsroute - chunked, multi-provider route directions
//!
//! This library turns arbitrary-length waypoint lists into routes by
//! splitting them into provider-sized requests, sending those requests one
//! after another and stitching the partial results back together.
//!
//! # High-Level API
//!
//! For interactive callers, the [`single_flight`] module serializes requests
//! through a single fetcher:
//!
//! ```ignore
//! use gpsroute::provider::{ProviderFactory, ProviderRegistry};
//! use gpsroute::single_flight::SingleFlightRequestQueue;
//! use gpsroute::transport::ReqwestTransport;
//!
//! let registry = ProviderRegistry::new();
//! let queue = SingleFlightRequestQueue::new(
//!     ProviderFactory::new(registry),
//!     ReqwestTransport::new()?,
//!     runtime.handle().clone(),
//! );
//! queue.post_request(&waypoints, VehicleType::Car, &RouteOptions::road(), Some(callback));
//! ```
//!
//! Lower-level building blocks are [`directions::DirectionsFetcher`] (one
//! load at a time, blocking `get_status`), [`route`] (the merge algebra) and
//! [`optimizer`] (2-opt reordering of waypoints).

pub mod config;
pub mod directions;
pub mod geo;
pub mod logging;
pub mod optimizer;
pub mod provider;
pub mod queue;
pub mod route;
pub mod single_flight;
pub mod status;
pub mod transport;

/// Version of the gpsroute library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
