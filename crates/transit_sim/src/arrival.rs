//! Arrival handler (C5, `spec.md` §4.5): alighting, boarding, and the
//! dispatch decision that advances, dwells, turns around, or retires a
//! vehicle. The single busiest piece of the simulator.

use std::collections::{BTreeSet, VecDeque};

use bevy_ecs::prelude::{Entity, World};

use crate::catalog::{RouteId, StopId};
use crate::clock::{EventSubject, Timeline};
use crate::dispatch::StopCoords;
use crate::error::{SimError, SimResult};
use crate::frames::FrameRecorder;
use crate::geodesy::{travel_seconds, GeoPoint};
use crate::metrics::MetricsAggregator;
use crate::stopstate::{StopIndex, StopState};
use crate::vehicle::{Direction, Vehicle};

/// Per-passenger dwell while boarding or alighting (§4.5 Constants).
pub const BOARD_ALIGHT_SECONDS: u64 = 4;

fn stop_entity_for(world: &World, stop_id: StopId) -> SimResult<Entity> {
    world
        .resource::<StopIndex>()
        .by_id
        .get(&stop_id)
        .copied()
        .ok_or_else(|| SimError::InternalInvariantViolated(format!("stop {} missing from index", stop_id.0)))
}

/// Any stop in `route_stop_ids` still has a waiting passenger (§4.5c).
fn has_demand_ahead(world: &World, route_stop_ids: &BTreeSet<StopId>) -> bool {
    let index = world.resource::<StopIndex>();
    route_stop_ids.iter().any(|stop_id| {
        index
            .by_id
            .get(stop_id)
            .and_then(|entity| world.get::<StopState>(*entity))
            .map(|state| !state.waiting.is_empty())
            .unwrap_or(false)
    })
}

/// Snapshot the triggering vehicle plus every currently non-empty stop.
fn emit_frame(world: &mut World, t: u64, vehicle_entity: Entity) -> SimResult<()> {
    let vehicle = world
        .get::<Vehicle>(vehicle_entity)
        .cloned()
        .ok_or_else(|| SimError::InternalInvariantViolated("frame for a despawned vehicle".to_string()))?;

    world.resource_scope(|world, mut recorder: bevy_ecs::prelude::Mut<FrameRecorder>| {
        let coords = world.resource::<StopCoords>().0.clone();
        let mut query = world.query::<&mut StopState>();
        let stops = query.iter_mut(world).map(|m| m.into_inner());
        recorder.record(t, &vehicle, stops, |id| coords.get(&id).copied());
    });
    Ok(())
}

pub fn arrival(world: &mut World, t: u64, vehicle_entity: Entity, stop_index: usize) -> SimResult<()> {
    {
        let mut vehicle = world
            .get_mut::<Vehicle>(vehicle_entity)
            .ok_or_else(|| SimError::InternalInvariantViolated("arrival for a despawned vehicle".to_string()))?;
        vehicle.current_index = stop_index;
    }

    let route_id: RouteId = world.get::<Vehicle>(vehicle_entity).unwrap().route_id;
    let stop_id: StopId = world.get::<Vehicle>(vehicle_entity).unwrap().current_point().stop_id;
    let stop_entity = stop_entity_for(world, stop_id)?;

    let mut t = t;

    // Arrive-dequeue frame: the instant the vehicle reaches the stop.
    emit_frame(world, t, vehicle_entity)?;

    // (a) Alighting.
    let k_off = {
        let mut vehicle = world.get_mut::<Vehicle>(vehicle_entity).unwrap();
        let before = vehicle.passengers.len();
        vehicle.passengers.retain(|p| p.destination_stop_id != stop_id);
        before - vehicle.passengers.len()
    };
    if k_off > 0 {
        t += k_off as u64 * BOARD_ALIGHT_SECONDS;
        emit_frame(world, t, vehicle_entity)?;
    }

    // (b) Boarding. `remaining` includes the current stop at position 0 so a
    // destination equal to the current stop (already excluded upstream) is
    // never mistaken for a one-stop-ahead trip.
    let remaining: Vec<StopId> = world.get::<Vehicle>(vehicle_entity).unwrap().remaining_stop_ids();

    let mut waiting: VecDeque<_> = {
        let mut stop_state = world.get_mut::<StopState>(stop_entity).unwrap();
        std::mem::take(&mut stop_state.waiting)
    };
    let mut leftover = VecDeque::new();
    let mut journeys: Vec<usize> = Vec::new();
    {
        let mut vehicle = world.get_mut::<Vehicle>(vehicle_entity).unwrap();
        while let Some(passenger) = waiting.pop_front() {
            let capacity_left = (vehicle.passengers.len() as u32) < vehicle.capacity;
            let position = remaining.iter().position(|id| *id == passenger.destination_stop_id);
            match (capacity_left, position) {
                (true, Some(pos)) if pos > 0 => {
                    journeys.push(pos);
                    vehicle.passengers.push(passenger);
                }
                _ => leftover.push_back(passenger),
            }
        }
    }
    {
        let mut stop_state = world.get_mut::<StopState>(stop_entity).unwrap();
        stop_state.waiting = leftover;
    }
    let k_on = journeys.len();
    for journey_len in journeys {
        world.resource_mut::<MetricsAggregator>().record_journey(route_id, journey_len);
    }
    if k_on > 0 {
        t += k_on as u64 * BOARD_ALIGHT_SECONDS;
        emit_frame(world, t, vehicle_entity)?;
    }

    // (c) Dispatch decision.
    let vehicle = world.get::<Vehicle>(vehicle_entity).unwrap().clone();
    let route_stop_ids: BTreeSet<StopId> = vehicle.polyline.iter().map(|p| p.stop_id).collect();
    let demand_ahead = has_demand_ahead(world, &route_stop_ids);

    if vehicle.is_at_terminal() && vehicle.passengers.is_empty() && !demand_ahead {
        world.get_mut::<Vehicle>(vehicle_entity).unwrap().retired = true;
        return Ok(());
    }

    if vehicle.is_at_far_terminal() {
        let headway_seconds = vehicle.interval_min as u64 * 60;
        let stop_state = world.get::<StopState>(stop_entity).unwrap();
        let last_dispatch = stop_state.last_dispatch_per_route.get(&route_id).copied();
        if let Some(last) = last_dispatch {
            if t.saturating_sub(last) < headway_seconds {
                let dwell_until = t + headway_seconds;
                world
                    .resource_mut::<Timeline>()
                    .schedule(dwell_until, EventSubject::Arrive { vehicle: vehicle_entity, stop_index });
                return Ok(());
            }
        }
    }

    {
        let mut stop_state = world.get_mut::<StopState>(stop_entity).unwrap();
        stop_state.last_dispatch_per_route.insert(route_id, t);
    }
    let fullness = world.get::<Vehicle>(vehicle_entity).unwrap().passengers.len();
    world.resource_mut::<MetricsAggregator>().record_fullness_sample(route_id, fullness);

    let prev_point = vehicle.current_point();
    let new_index = {
        let mut v = world.get_mut::<Vehicle>(vehicle_entity).unwrap();
        if v.is_at_far_terminal() {
            v.polyline.reverse();
            v.current_index = 1;
            v.direction = match v.direction {
                Direction::Forward => Direction::Reverse,
                Direction::Reverse => Direction::Forward,
            };
            v.completed_trips += 1;
            v.current_index
        } else {
            v.current_index += 1;
            v.current_index
        }
    };
    if vehicle.is_at_far_terminal() {
        world.resource_mut::<MetricsAggregator>().record_completed_trip(route_id);
    }
    let new_point = world.get::<Vehicle>(vehicle_entity).unwrap().current_point();

    let travel = travel_seconds(
        GeoPoint::new(prev_point.lat, prev_point.lon),
        GeoPoint::new(new_point.lat, new_point.lon),
    );
    world.resource_mut::<Timeline>().schedule(
        t + travel,
        EventSubject::Arrive {
            vehicle: vehicle_entity,
            stop_index: new_index,
        },
    );
    Ok(())
}
