//! Scenario Resolver (C2, `spec.md` §4.2): validates a `CalculationRequest`
//! against the catalog and produces a self-contained, immutable `SimInput`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::DataToCalculate;
use crate::catalog::{Catalog, CityId, Route, RouteId, Stop, StopId};
use crate::error::{SimError, SimResult};

/// Sentinel destination-stop id denoting undirected demand, assigned a
/// random valid destination at simulator init (§4.2 step 5).
pub const UNDIRECTED_DESTINATION: u32 = 0;

#[derive(Debug, Clone)]
pub struct StopDemand {
    pub origin_stop_id: StopId,
    /// destination stop id (or [`UNDIRECTED_DESTINATION`]) -> passenger count.
    pub counts: BTreeMap<u32, u32>,
}

/// Immutable, self-contained simulation input (§3).
#[derive(Debug, Clone)]
pub struct SimInput {
    pub city_id: CityId,
    pub routes: Vec<Route>,
    pub stops_indexed: HashMap<StopId, Stop>,
    pub demands: Vec<StopDemand>,
}

fn route_is_eligible(route: &Route) -> bool {
    route.busstops.len() >= 2 && route.has_fleet()
}

/// Stops reachable from `origin` via any resolved route that serves it,
/// excluding the origin itself, restricted to `scenario_stops`.
pub(crate) fn valid_destinations(
    origin: StopId,
    routes: &[Route],
    scenario_stops: &BTreeSet<StopId>,
) -> BTreeSet<StopId> {
    let mut out = BTreeSet::new();
    for route in routes {
        if route.busstops.contains(&origin) {
            for stop_id in &route.busstops {
                if *stop_id != origin && scenario_stops.contains(stop_id) {
                    out.insert(*stop_id);
                }
            }
        }
    }
    out
}

pub fn resolve_scenario(catalog: &Catalog, request: &DataToCalculate) -> SimResult<SimInput> {
    let city_id = CityId(request.city_id);
    if catalog.city(city_id).is_none() {
        return Err(SimError::UnknownCity(request.city_id));
    }

    // Step 1: resolve routes by (city_id, id); missing routes are skipped with a warning.
    let mut resolved: Vec<Route> = Vec::new();
    for route_ref in &request.routes {
        match catalog.route(city_id, RouteId(route_ref.id)) {
            Some(route) if route_is_eligible(route) => resolved.push(route.clone()),
            Some(_) => {
                log::warn!(
                    "route {} has fewer than two stops or no fleet, skipping",
                    route_ref.id
                );
            }
            None => {
                log::warn!("requested route {} not found, skipping", route_ref.id);
            }
        }
    }
    if resolved.is_empty() {
        return Err(SimError::NoRoutes {
            city_id: request.city_id,
        });
    }

    // Step 2: stop set = union of stops belonging to at least one resolved route.
    let scenario_stops: BTreeSet<StopId> = resolved
        .iter()
        .flat_map(|r| r.busstops.iter().copied())
        .collect();

    let mut stops_indexed = HashMap::new();
    for stop_id in &scenario_stops {
        match catalog.stop(*stop_id) {
            Some(stop) => {
                stops_indexed.insert(*stop_id, stop.clone());
            }
            None => log::warn!("stop {} referenced by a route is missing from the catalog", stop_id.0),
        }
    }

    // Step 3: build a StopDemand per requested entry whose stop is in the scenario stop set.
    let mut demands: Vec<StopDemand> = Vec::new();
    let mut sorted_requests: Vec<(u32, &crate::api::BusStopRequest)> = request
        .busstops
        .iter()
        .filter_map(|(k, v)| k.parse::<u32>().ok().map(|id| (id, v)))
        .collect();
    sorted_requests.sort_by_key(|(id, _)| *id);

    for (stop_id_raw, busstop_request) in sorted_requests {
        let origin = StopId(stop_id_raw);
        if !scenario_stops.contains(&origin) {
            continue;
        }
        let valid = valid_destinations(origin, &resolved, &scenario_stops);

        let mut counts = BTreeMap::new();
        for entry in &busstop_request.directions {
            if entry.busstop_id == stop_id_raw {
                continue;
            }
            if entry.passengers_count < 1 {
                continue;
            }
            if !valid.contains(&StopId(entry.busstop_id)) {
                continue;
            }
            *counts.entry(entry.busstop_id).or_insert(0) += entry.passengers_count;
        }
        if busstop_request.passengers_without_direction > 0 {
            *counts.entry(UNDIRECTED_DESTINATION).or_insert(0) +=
                busstop_request.passengers_without_direction;
        }

        if !counts.is_empty() {
            demands.push(StopDemand {
                origin_stop_id: origin,
                counts,
            });
        }
    }

    if demands.is_empty() {
        return Err(SimError::NoDemand);
    }

    Ok(SimInput {
        city_id,
        routes: resolved,
        stops_indexed,
        demands,
    })
}
