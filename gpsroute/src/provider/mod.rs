//! Directions providers.
//!
//! A provider turns a chunk of waypoints into an HTTP request and the
//! response back into a [`Route`](crate::route::Route). Per-provider
//! credentials live in the shared [`ProviderRegistry`]; the
//! [`ProviderFactory`] builds providers bound to it.
//!
//! # Providers
//!
//! - [`OsrmProvider`] - OSRM route service, no key required
//! - [`OrsProvider`] - openrouteservice, requires an API key

mod factory;
mod ors;
mod osrm;
mod registry;
mod types;

pub use factory::ProviderFactory;
pub use ors::{OrsProvider, ORS_DEFAULT_URL, ORS_MAX_WAYPOINTS, ORS_MIN_REQUEST_INTERVAL};
pub use osrm::{OsrmProvider, OSRM_DEFAULT_URL, OSRM_MAX_WAYPOINTS};
pub use registry::{ProviderRegistry, ProviderSettings, RegistryError};
pub use types::{DirectionsProvider, ProviderError, ProviderId};

#[cfg(test)]
pub(crate) use osrm::tests::OSRM_OK_BODY;
