//! CLI command implementations.
//!
//! - [`route`] - resolve directions through waypoints
//! - [`optimize`] - 2-opt waypoint reordering

pub mod common;
pub mod optimize;
pub mod route;
