//! Builds the ECS `World` for a run: resolves each route's polyline to
//! stops, spawns `Vehicle` dispatch events and `StopState` entities, and
//! materializes waiting passengers (§4.5 Initialization).

use std::collections::BTreeSet;

use bevy_ecs::prelude::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{Catalog, Route, StopId};
use crate::clock::{EventSubject, Timeline};
use crate::dispatch::{ResolvedPolylines, RouteRuntime, RouteRuntimeTable, StopCoords};
use crate::error::{SimError, SimResult};
use crate::geodesy::{distance_km, GeoPoint};
use crate::metrics::MetricsAggregator;
use crate::scenario::{valid_destinations, SimInput, UNDIRECTED_DESTINATION};
use crate::stopstate::{StopIndex, StopState};
use crate::vehicle::{Passenger, PolylinePoint};

const SAMPLE_FIRST_NAMES: &[&str] = &[
    "Anna", "Boris", "Clara", "Dmitri", "Elena", "Felix", "Greta", "Igor", "Julia", "Kirill",
    "Larisa", "Maxim", "Nadia", "Oleg", "Polina",
];

fn resolve_polyline(route: &Route, stops_indexed: &std::collections::HashMap<StopId, crate::catalog::Stop>) -> SimResult<Vec<PolylinePoint>> {
    let mut out = Vec::with_capacity(route.list_coord.len());
    for raw in &route.list_coord {
        let point = GeoPoint::new(raw.lat, raw.lon);
        let mut best: Option<(StopId, f64)> = None;
        for stop_id in &route.busstops {
            let Some(stop) = stops_indexed.get(stop_id) else {
                continue;
            };
            let stop_point = stop.point();
            if point.matches(&stop_point) {
                let d = distance_km(point, stop_point);
                if best.map(|(_, best_d)| d < best_d).unwrap_or(true) {
                    best = Some((*stop_id, d));
                }
            }
        }
        match best {
            Some((stop_id, _)) => out.push(PolylinePoint {
                stop_id,
                lat: raw.lat,
                lon: raw.lon,
            }),
            None => {
                return Err(SimError::UnresolvablePolylinePoint {
                    route_id: route.id.0,
                    lat: raw.lat,
                    lon: raw.lon,
                })
            }
        }
    }
    Ok(out)
}

fn next_name(rng: &mut StdRng) -> String {
    let idx = rng.gen_range(0..SAMPLE_FIRST_NAMES.len());
    SAMPLE_FIRST_NAMES[idx].to_string()
}

/// Builds the world's entities and schedules the initial `Dispatch` events.
/// Returns the `StopIndex` so callers (and tests) can address stops by id.
pub fn initialize_world(
    world: &mut World,
    catalog: &Catalog,
    input: &SimInput,
    seed: u64,
) -> SimResult<StopIndex> {
    let mut rng = StdRng::seed_from_u64(seed);

    world.insert_resource(Timeline::new());
    world.insert_resource(MetricsAggregator::default());
    world.insert_resource(crate::frames::FrameRecorder::default());

    // Resolve every route's polyline once; stash it for the dispatch handler
    // so each vehicle clones a ready-made itinerary rather than re-resolving.
    let mut resolved_polylines = std::collections::HashMap::new();
    let mut runtime_table = std::collections::HashMap::new();
    for route in &input.routes {
        let polyline = resolve_polyline(route, &input.stops_indexed)?;
        resolved_polylines.insert(route.id, polyline);

        let capacity = route
            .vehicle_type_id
            .and_then(|id| catalog.vehicle_type(id))
            .map(|vt| vt.capacity)
            .ok_or(SimError::NoFleet { route_id: route.id.0 })?;
        runtime_table.insert(
            route.id,
            RouteRuntime {
                capacity,
                interval_min: route.interval_min,
            },
        );
    }
    world.insert_resource(ResolvedPolylines(resolved_polylines));
    world.insert_resource(RouteRuntimeTable(runtime_table));

    let stop_coords: std::collections::HashMap<StopId, (f64, f64)> = input
        .stops_indexed
        .values()
        .map(|s| (s.id, (s.lat, s.lon)))
        .collect();
    world.insert_resource(StopCoords(stop_coords));

    let scenario_stops: BTreeSet<StopId> = input.stops_indexed.keys().copied().collect();

    // Spawn a StopState entity per stop touched by a resolved route (even if
    // it has no demand), so the simulator can address every stop by id.
    let mut stop_index = StopIndex::default();
    let mut stop_entities: std::collections::HashMap<StopId, Entity> = std::collections::HashMap::new();
    for stop_id in &scenario_stops {
        let entity = world.spawn(StopState::new(*stop_id)).id();
        stop_entities.insert(*stop_id, entity);
        stop_index.by_id.insert(*stop_id, entity);
    }

    // Materialize passengers into their origin's waiting queue.
    for demand in &input.demands {
        let valid = valid_destinations(demand.origin_stop_id, &input.routes, &scenario_stops);
        let valid_list: Vec<StopId> = valid.into_iter().collect();
        let entity = stop_entities[&demand.origin_stop_id];
        let mut stop_state = world.get_mut::<StopState>(entity).expect("spawned above");

        for (&dest_key, &count) in &demand.counts {
            for _ in 0..count {
                let destination = if dest_key == UNDIRECTED_DESTINATION {
                    if valid_list.is_empty() {
                        continue;
                    }
                    valid_list[rng.gen_range(0..valid_list.len())]
                } else {
                    StopId(dest_key)
                };
                stop_state.waiting.push_back(Passenger {
                    origin_stop_id: demand.origin_stop_id,
                    destination_stop_id: destination,
                    display_name: next_name(&mut rng),
                });
            }
        }
        stop_state.initial_passengers_count = stop_state.waiting.len();
    }

    // Schedule dispatch events: amount per route at t = 0, interval*60, 2*interval*60, ...
    let mut timeline = world.resource_mut::<Timeline>();
    for route in &input.routes {
        let amount = route.amount.unwrap_or(0);
        if amount == 0 {
            return Err(SimError::NoFleet { route_id: route.id.0 });
        }
        for idx in 1..=amount {
            let t = (idx as u64 - 1) * route.interval_min as u64 * 60;
            timeline.schedule(
                t,
                EventSubject::Dispatch {
                    route_id: route.id,
                    vehicle_index: idx,
                },
            );
        }
    }

    world.insert_resource(stop_index.clone());
    Ok(stop_index)
}
