//! Throughput benchmark for the end-to-end simulation pipeline: resolve,
//! initialize, drain the timeline, build the report.

use std::collections::{BTreeMap, BTreeSet};

use criterion::{criterion_group, criterion_main, Criterion};

use transit_sim::api::{BusStopRequest, CalculationRequest, DataToCalculate, RouteRequest};
use transit_sim::catalog::{
    Catalog, City, CityId, RawPoint, Route, RouteId, Stop, StopId, VehicleType, VehicleTypeId,
};

/// A single route with `stop_count` evenly spaced stops and undirected
/// demand seeded at every stop, so the run exercises boarding, alighting,
/// and turn-around logic across a realistic number of vehicles.
fn catalog_and_request(stop_count: u32, fleet_size: u32) -> (Catalog, CalculationRequest) {
    let mut cat = Catalog::new();
    cat.add_city(City {
        id: CityId(1),
        name: "Benchville".into(),
        lat: 0.0,
        lon: 0.0,
    });
    cat.add_vehicle_type(VehicleType {
        id: VehicleTypeId(1),
        name: "Bus".into(),
        capacity: 40,
    });

    let mut busstops = BTreeSet::new();
    let mut list_coord = Vec::new();
    for i in 0..stop_count {
        let lat = i as f64 * 0.01;
        cat.add_stop(Stop {
            id: StopId(i + 1),
            city_id: CityId(1),
            name: format!("Stop{i}"),
            lat,
            lon: 0.0,
        });
        busstops.insert(StopId(i + 1));
        list_coord.push(RawPoint { lat, lon: 0.0 });
    }
    cat.add_route(Route {
        id: RouteId(1),
        city_id: CityId(1),
        name: "Bench Line".into(),
        vehicle_type_id: Some(VehicleTypeId(1)),
        interval_min: 8,
        amount: Some(fleet_size),
        list_coord,
        busstops,
    });

    let mut requested_stops = BTreeMap::new();
    for i in 0..stop_count {
        requested_stops.insert(
            (i + 1).to_string(),
            BusStopRequest {
                passengers_without_direction: 5,
                directions: vec![],
            },
        );
    }

    let request = CalculationRequest {
        data_to_calculate: DataToCalculate {
            city_id: 1,
            routes: vec![RouteRequest {
                id: 1,
                name: None,
            }],
            busstops: requested_stops,
        },
        get_timeline: true,
        seed: Some(7),
        simulation_id: None,
    };
    (cat, request)
}

fn bench_run_simulation(c: &mut Criterion) {
    let (catalog, request) = catalog_and_request(20, 3);
    c.bench_function("run_simulation_20_stops_3_vehicles", |b| {
        b.iter(|| {
            let response = transit_sim::run_simulation(&catalog, &request);
            assert_eq!(response.error, 0);
        })
    });
}

criterion_group!(benches, bench_run_simulation);
criterion_main!(benches);
