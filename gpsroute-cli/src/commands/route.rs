//! `gpsroute route` - resolve directions through waypoints.

use std::sync::{mpsc, Arc};

use clap::Args;
use gpsroute::config::ConfigFile;
use gpsroute::directions::EndCallback;
use gpsroute::geo::LatLng;
use gpsroute::provider::ProviderId;
use gpsroute::route::{Route, RouteOptions, VehicleType};
use gpsroute::single_flight::SingleFlightRequestQueue;
use gpsroute::status::StatusCode;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::warn;

use super::common::{
    format_duration, format_km, http_transport, parse_point, provider_factory, ProviderArg,
    VehicleArg,
};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Provider to use (default: [provider] default from config.ini)
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Vehicle type
    #[arg(long, value_enum, default_value = "car")]
    vehicle: VehicleArg,

    /// Report one route per request chunk instead of a merged route
    #[arg(long)]
    unlinked: bool,

    /// Waypoints as LAT,LNG (at least two)
    #[arg(required = true, num_args = 2.., allow_hyphen_values = true, value_parser = parse_point)]
    points: Vec<LatLng>,
}

pub fn run(args: RouteArgs, config: &ConfigFile, runtime: &Handle) -> Result<(), CliError> {
    let factory = provider_factory(config);
    let id: ProviderId = args
        .provider
        .map(Into::into)
        .unwrap_or_else(|| factory.registry().default_provider());
    let provider = factory.create(id)?;

    let vehicle: VehicleType = args.vehicle.into();
    let options = match provider.supported_travel_options().get(&vehicle) {
        Some(accepted) => RouteOptions::from_accepted(accepted),
        None => {
            warn!(provider = %id, vehicle = vehicle.name(), "vehicle not supported by provider, using defaults");
            RouteOptions::for_vehicle(vehicle)
        }
    }
    .with_linked(!args.unlinked);

    let queue = SingleFlightRequestQueue::with_config(
        factory,
        http_transport(config)?,
        runtime.clone(),
        config.fetcher_config(),
    );
    queue.bind_provider(provider);

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let callback: EndCallback = Arc::new(move |status: StatusCode, routes: &[Route]| {
        let _ = tx.lock().send((status, routes.to_vec()));
    });

    println!(
        "Requesting {} waypoints from {} ({})",
        args.points.len(),
        id,
        vehicle.name()
    );
    queue.post_request(&args.points, vehicle, &options, Some(callback));

    let (status, routes) = rx
        .recv()
        .map_err(|_| CliError::Directions(StatusCode::UnknownError))?;

    println!("Status: {}", status);
    for (index, route) in routes.iter().enumerate() {
        println!(
            "  Route {}: {}, {}, {} locations, {} polyline points, {} steps",
            index + 1,
            format_km(route.summary.distance()),
            format_duration(route.summary.duration()),
            route.locations.len(),
            route.polyline.len(),
            route.steps.len()
        );
    }

    if status.is_ok() || status == StatusCode::ZeroResults {
        Ok(())
    } else {
        Err(CliError::Directions(status))
    }
}
