//! Frame Recorder (C7, `spec.md` §4.7): playback snapshots consumed by the
//! (out of scope) UI. A frame is appended after every alight/board that
//! moved at least one passenger, and once more whenever an `Arrive` event
//! is dequeued, then the whole set is sorted by time once the run ends.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::catalog::{RouteId, StopId};
use crate::stopstate::StopState;
use crate::vehicle::Vehicle;

/// Vehicle snapshots cap the embedded passenger name list at this many
/// entries; the full roster is recoverable from the report, not playback.
pub const MAX_SNAPSHOT_PASSENGER_NAMES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleSnapshot {
    pub bus_id: u64,
    pub route_id: u32,
    pub capacity: u32,
    pub stop_id: u32,
    pub lat: f64,
    pub lon: f64,
    pub passengers_count: usize,
    pub passenger_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopSnapshot {
    pub stop_id: u32,
    pub lat: f64,
    pub lon: f64,
    pub passengers_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FrameBody {
    pub buses: Vec<VehicleSnapshot>,
    pub stops: Vec<StopSnapshot>,
}

pub fn vehicle_bus_id(route_id: RouteId, vehicle_index: u32) -> u64 {
    ((route_id.0 as u64) << 32) | vehicle_index as u64
}

pub fn vehicle_snapshot(vehicle: &Vehicle) -> VehicleSnapshot {
    let point = vehicle.current_point();
    let names = vehicle
        .passengers
        .iter()
        .take(MAX_SNAPSHOT_PASSENGER_NAMES)
        .map(|p| p.display_name.clone())
        .collect();
    VehicleSnapshot {
        bus_id: vehicle_bus_id(vehicle.route_id, vehicle.vehicle_index),
        route_id: vehicle.route_id.0,
        capacity: vehicle.capacity,
        stop_id: point.stop_id.0,
        lat: point.lat,
        lon: point.lon,
        passengers_count: vehicle.passengers.len(),
        passenger_names: names,
    }
}

#[derive(Debug, Default, Resource)]
pub struct FrameRecorder {
    frames: Vec<(u64, FrameBody)>,
}

impl FrameRecorder {
    /// Emit a frame: the triggering vehicle's snapshot, plus every stop
    /// that currently has a non-empty waiting queue (§4.7).
    pub fn record<'a>(
        &mut self,
        t: u64,
        vehicle: &Vehicle,
        stops: impl Iterator<Item = &'a mut StopState>,
        stop_coords: impl Fn(StopId) -> Option<(f64, f64)>,
    ) {
        let mut stop_snapshots = Vec::new();
        for stop in stops {
            if stop.waiting.is_empty() {
                continue;
            }
            stop.last_seen_nonempty_at = Some(t);
            let (lat, lon) = stop_coords(stop.stop_id).unwrap_or((0.0, 0.0));
            stop_snapshots.push(StopSnapshot {
                stop_id: stop.stop_id.0,
                lat,
                lon,
                passengers_count: stop.waiting.len(),
            });
        }
        stop_snapshots.sort_by_key(|s| s.stop_id);

        self.frames.push((
            t,
            FrameBody {
                buses: vec![vehicle_snapshot(vehicle)],
                stops: stop_snapshots,
            },
        ));
    }

    /// Sort by time and hand back the finished timeline (§8: "t monotonically
    /// non-decreasing after the final sort").
    pub fn into_sorted(mut self) -> Vec<(u64, FrameBody)> {
        self.frames.sort_by_key(|(t, _)| *t);
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_id_is_stable_per_route_and_index() {
        let a = vehicle_bus_id(RouteId(1), 2);
        let b = vehicle_bus_id(RouteId(1), 2);
        let c = vehicle_bus_id(RouteId(1), 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
