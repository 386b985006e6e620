//! # Transit Load Simulator Core
//!
//! A discrete-event simulation engine for estimating the operational load
//! of an urban public-transport network.
//!
//! ## Overview
//!
//! This crate resolves a caller's scenario against a read-only [`catalog`]
//! into a self-contained [`scenario::SimInput`], runs the event-driven
//! vehicle/stop state machines ([`dispatch`], [`arrival`]) to completion
//! over a [`clock::Timeline`], and folds the run into a
//! [`report::ReportStructure`] plus an optional [`frames`] playback. The
//! HTTP surface, catalog persistence, and the map UI that consume these
//! types are external collaborators, not part of this crate.
//!
//! ## Key Concepts
//!
//! - **Discrete events**: simulated time advances only via `Timeline`, never a real clock.
//! - **Deterministic**: a seeded RNG and an insertion-ordered tie-break make two runs
//!   of the same `SimInput` and seed bit-identical.
//! - **Entity Component System**: vehicles and stop queues are `bevy_ecs` entities;
//!   the event loop mutates them directly rather than through a `Schedule`, since this
//!   domain has exactly two event kinds.
//!
//! ## Example
//!
//! ```rust,no_run
//! use transit_sim::api::CalculationRequest;
//! use transit_sim::catalog::Catalog;
//!
//! fn run(catalog: &Catalog, request: &CalculationRequest) {
//!     let response = transit_sim::run_simulation(catalog, request);
//!     println!("error={}", response.error);
//! }
//! ```

pub mod api;
pub mod arrival;
pub mod catalog;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod frames;
pub mod geodesy;
pub mod init;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod stopstate;
pub mod vehicle;

use bevy_ecs::prelude::World;

use crate::api::{CalculationRequest, CalculationResponse};
use crate::catalog::Catalog;
use crate::frames::FrameRecorder;
use crate::metrics::MetricsAggregator;
use crate::stopstate::StopState;

/// Runs one simulation end to end: resolve, initialize, drain the timeline,
/// and build the response. Never panics on malformed input — every failure
/// mode short-circuits into an `error != 0` `CalculationResponse` (§6, §7).
pub fn run_simulation(catalog: &Catalog, request: &CalculationRequest) -> CalculationResponse {
    let input = match scenario::resolve_scenario(catalog, &request.data_to_calculate) {
        Ok(input) => input,
        Err(err) => return CalculationResponse::err(&err, request.simulation_id),
    };

    let seed = request.seed.map(|s| s as u64).unwrap_or_else(rand::random);

    let mut world = World::new();
    if let Err(err) = init::initialize_world(&mut world, catalog, &input, seed) {
        return CalculationResponse::err(&err, request.simulation_id);
    }

    if let Err(err) = runner::run_until_empty(&mut world) {
        return CalculationResponse::err(&err, request.simulation_id);
    }

    let stop_states: Vec<StopState> = {
        let mut query = world.query::<&StopState>();
        query.iter(&world).cloned().collect()
    };
    let metrics = world.resource::<MetricsAggregator>().clone();
    let report = report::build_report(catalog, &input, &metrics, &stop_states);

    let frames = if request.get_timeline {
        let recorder = world.remove_resource::<FrameRecorder>().unwrap_or_default();
        Some(recorder.into_sorted())
    } else {
        None
    };

    CalculationResponse::ok(report, frames, request.simulation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BusStopRequest, DataToCalculate, DirectionEntry, RouteRequest};
    use crate::catalog::{City, CityId, RawPoint, Route, RouteId, Stop, StopId, VehicleType, VehicleTypeId};
    use std::collections::{BTreeMap, BTreeSet};

    fn two_stop_catalog() -> Catalog {
        let mut cat = Catalog::new();
        cat.add_city(City {
            id: CityId(1),
            name: "Testville".into(),
            lat: 0.0,
            lon: 0.0,
        });
        cat.add_vehicle_type(VehicleType {
            id: VehicleTypeId(1),
            name: "Bus".into(),
            capacity: 50,
        });
        cat.add_stop(Stop {
            id: StopId(1),
            city_id: CityId(1),
            name: "A".into(),
            lat: 0.0,
            lon: 0.0,
        });
        cat.add_stop(Stop {
            id: StopId(2),
            city_id: CityId(1),
            name: "B".into(),
            lat: 0.036,
            lon: 0.0,
        });
        let mut busstops = BTreeSet::new();
        busstops.insert(StopId(1));
        busstops.insert(StopId(2));
        cat.add_route(Route {
            id: RouteId(10),
            city_id: CityId(1),
            name: "R10".into(),
            vehicle_type_id: Some(VehicleTypeId(1)),
            interval_min: 10,
            amount: Some(1),
            list_coord: vec![
                RawPoint { lat: 0.0, lon: 0.0 },
                RawPoint { lat: 0.036, lon: 0.0 },
            ],
            busstops,
        });
        cat
    }

    /// Walks through `spec.md` §8 scenario S2 end to end.
    #[test]
    fn single_vehicle_two_stops_one_passenger_completes_one_trip() {
        let cat = two_stop_catalog();
        let mut busstops = BTreeMap::new();
        busstops.insert(
            "1".to_string(),
            BusStopRequest {
                passengers_without_direction: 0,
                directions: vec![DirectionEntry {
                    busstop_id: 2,
                    passengers_count: 1,
                }],
            },
        );
        let request = CalculationRequest {
            data_to_calculate: DataToCalculate {
                city_id: 1,
                routes: vec![RouteRequest { id: 10, name: None }],
                busstops,
            },
            get_timeline: true,
            seed: Some(1),
            simulation_id: Some(42),
        };

        let response = run_simulation(&cat, &request);
        assert_eq!(response.error, 0, "{:?}", response.error_message);
        assert_eq!(response.simulation_id, Some(42));

        let report = response.data_to_report.unwrap();
        assert_eq!(report.total_trips_count, 1);
        let route_row = &report.routes[0];
        assert_eq!(route_row.completed_trips, 1);
        assert_eq!(route_row.average_journey_stops, 1.0);
        assert!((route_row.route_length_km - 4.0).abs() < 0.1);

        let frames = response.calculate.unwrap();
        assert!(!frames.is_empty());
        assert!(frames.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn empty_demand_surfaces_as_no_demand_error() {
        let cat = two_stop_catalog();
        let request = CalculationRequest {
            data_to_calculate: DataToCalculate {
                city_id: 1,
                routes: vec![RouteRequest { id: 10, name: None }],
                busstops: BTreeMap::new(),
            },
            get_timeline: true,
            seed: Some(1),
            simulation_id: None,
        };

        let response = run_simulation(&cat, &request);
        assert_eq!(response.error, 1);
        assert_eq!(response.stage.as_deref(), Some("data_preparation"));
        assert!(response.calculate.is_none());
        assert!(response.data_to_report.is_none());
    }
}
