//! `gpsroute optimize` - 2-opt waypoint reordering.

use clap::Args;
use gpsroute::config::ConfigFile;
use gpsroute::directions::DirectionsFetcher;
use gpsroute::geo::LatLng;
use gpsroute::optimizer::{DistanceMetric, GeometricDistance, RoadDistance, RouteOptimizer};
use gpsroute::provider::ProviderId;
use gpsroute::route::{RouteOptions, VehicleType};
use tokio::runtime::Handle;

use super::common::{format_km, http_transport, parse_point, provider_factory, ProviderArg, VehicleArg};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    /// Measure legs by road distance (default: [optimizer] road_distances)
    #[arg(long)]
    road: bool,

    /// Provider for road distances
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Vehicle for road distances
    #[arg(long, value_enum, default_value = "car")]
    vehicle: VehicleArg,

    /// Waypoints as LAT,LNG; the first and last stay in place
    #[arg(required = true, num_args = 2.., allow_hyphen_values = true, value_parser = parse_point)]
    points: Vec<LatLng>,
}

pub fn run(args: OptimizeArgs, config: &ConfigFile, runtime: &Handle) -> Result<(), CliError> {
    if !(args.road || config.optimizer.road_distances) {
        report(RouteOptimizer::new(args.points, GeometricDistance));
        return Ok(());
    }

    let factory = provider_factory(config);
    let id: ProviderId = args
        .provider
        .map(Into::into)
        .unwrap_or_else(|| factory.registry().default_provider());
    let provider = factory.create(id)?;
    let fetcher = DirectionsFetcher::with_config(
        provider,
        http_transport(config)?,
        runtime.clone(),
        &config.fetcher_config(),
    );

    let vehicle: VehicleType = args.vehicle.into();
    let metric = RoadDistance::new(fetcher)
        .with_vehicle(vehicle)
        .with_options(RouteOptions::for_vehicle(vehicle));

    println!("Measuring road distances with {}", id);
    report(RouteOptimizer::new(args.points, metric));
    Ok(())
}

fn report<M: DistanceMetric>(mut optimizer: RouteOptimizer<M>) {
    let identity: Vec<usize> = (0..optimizer.len()).collect();
    let before = optimizer.cumulative_distance(&identity);
    let order = optimizer.optimize();
    let after = optimizer.cumulative_distance(&order);

    println!("Optimized order:");
    for (position, &index) in order.iter().enumerate() {
        println!("  {:>3}. #{} {}", position + 1, index, optimizer.points()[index]);
    }
    println!("Distance: {} -> {}", format_km(before), format_km(after));
}
