//! Dispatch event handling (§4.5 Initialization step 1, state table row 1):
//! turns a scheduled departure into a live `Vehicle` entity and hands it
//! straight to the arrival handler at the same simulated second.

use std::collections::HashMap;

use bevy_ecs::prelude::{Resource, World};

use crate::catalog::{RouteId, StopId};
use crate::clock::{EventSubject, Timeline};
use crate::error::{SimError, SimResult};
use crate::vehicle::{Direction, PolylinePoint, Vehicle};

/// Every resolved route's stop-matched polyline, computed once at init so
/// each dispatched vehicle clones a ready-made itinerary.
#[derive(Debug, Default, Resource)]
pub struct ResolvedPolylines(pub HashMap<RouteId, Vec<PolylinePoint>>);

/// Per-route constants a dispatched vehicle needs but the route itself
/// (a `Catalog` type, not a `Component`) is not kept around for.
#[derive(Debug, Clone, Copy)]
pub struct RouteRuntime {
    pub capacity: u32,
    pub interval_min: u32,
}

#[derive(Debug, Default, Resource)]
pub struct RouteRuntimeTable(pub HashMap<RouteId, RouteRuntime>);

/// Stop coordinates, for frame snapshots; `StopState` itself only knows ids.
#[derive(Debug, Clone, Default, Resource)]
pub struct StopCoords(pub HashMap<StopId, (f64, f64)>);

pub fn dispatch(world: &mut World, t: u64, route_id: RouteId, vehicle_index: u32) -> SimResult<()> {
    let polyline = world
        .resource::<ResolvedPolylines>()
        .0
        .get(&route_id)
        .cloned()
        .ok_or_else(|| {
            SimError::InternalInvariantViolated(format!(
                "dispatch for route {} with no resolved polyline",
                route_id.0
            ))
        })?;
    let runtime = *world
        .resource::<RouteRuntimeTable>()
        .0
        .get(&route_id)
        .ok_or(SimError::NoFleet { route_id: route_id.0 })?;

    let vehicle = Vehicle {
        route_id,
        vehicle_index,
        capacity: runtime.capacity,
        polyline,
        current_index: 0,
        direction: Direction::Forward,
        passengers: Vec::new(),
        completed_trips: 0,
        interval_min: runtime.interval_min,
        retired: false,
    };
    let entity = world.spawn(vehicle).id();

    world.resource_mut::<Timeline>().schedule(
        t,
        EventSubject::Arrive {
            vehicle: entity,
            stop_index: 0,
        },
    );
    Ok(())
}
