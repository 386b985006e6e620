//! Vehicle and passenger data (§3, §4.5).
//!
//! `Vehicle` is a `bevy_ecs::Component` attached to an entity spawned by
//! `dispatch_system`; its itinerary state (`current_index`, `direction`)
//! advances as `arrival_system` processes `Arrive` events. Passengers are
//! plain data owned by whichever container currently holds them — a
//! `Vehicle.passengers` vec or a `StopState.waiting` queue — never an
//! entity of their own, since nothing ever needs to query passengers
//! independently of their container.

use bevy_ecs::prelude::Component;

use crate::catalog::{RouteId, StopId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylinePoint {
    pub stop_id: StopId,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub origin_stop_id: StopId,
    pub destination_stop_id: StopId,
    pub display_name: String,
}

#[derive(Debug, Clone, Component)]
pub struct Vehicle {
    pub route_id: RouteId,
    /// 1-based index within the route's fleet.
    pub vehicle_index: u32,
    pub capacity: u32,
    pub polyline: Vec<PolylinePoint>,
    pub current_index: usize,
    pub direction: Direction,
    pub passengers: Vec<Passenger>,
    pub completed_trips: u32,
    /// Headway in minutes, copied from the route for quick access.
    pub interval_min: u32,
    pub retired: bool,
}

impl Vehicle {
    pub fn last_index(&self) -> usize {
        self.polyline.len() - 1
    }

    pub fn is_at_start_terminal(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_at_far_terminal(&self) -> bool {
        self.current_index == self.last_index()
    }

    pub fn is_at_terminal(&self) -> bool {
        self.is_at_start_terminal() || self.is_at_far_terminal()
    }

    pub fn current_point(&self) -> PolylinePoint {
        self.polyline[self.current_index]
    }

    /// Ordered stop ids the vehicle will visit before (and including) its
    /// next terminal, current stop included (§4.5.1).
    ///
    /// At the far terminal, `remaining` is the *reverse* of the polyline
    /// from position 0 onward — the return leg the vehicle is about to
    /// begin once its direction flips (§4.5.1, §4.5c turnaround).
    pub fn remaining_stop_ids(&self) -> Vec<StopId> {
        if self.is_at_far_terminal() {
            self.polyline.iter().rev().map(|p| p.stop_id).collect()
        } else {
            self.polyline[self.current_index..]
                .iter()
                .map(|p| p.stop_id)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u32, lat: f64) -> PolylinePoint {
        PolylinePoint {
            stop_id: StopId(id),
            lat,
            lon: 0.0,
        }
    }

    fn sample_vehicle(current_index: usize) -> Vehicle {
        Vehicle {
            route_id: RouteId(1),
            vehicle_index: 1,
            capacity: 10,
            polyline: vec![point(1, 0.0), point(2, 1.0), point(3, 2.0)],
            current_index,
            direction: Direction::Forward,
            passengers: vec![],
            completed_trips: 0,
            interval_min: 10,
            retired: false,
        }
    }

    #[test]
    fn remaining_stops_from_middle_excludes_earlier_stops() {
        let v = sample_vehicle(1);
        assert_eq!(
            v.remaining_stop_ids(),
            vec![StopId(2), StopId(3)]
        );
    }

    #[test]
    fn remaining_stops_at_far_terminal_is_the_reversed_return_leg() {
        let v = sample_vehicle(2);
        assert!(v.is_at_far_terminal());
        assert_eq!(
            v.remaining_stop_ids(),
            vec![StopId(3), StopId(2), StopId(1)]
        );
    }

    #[test]
    fn remaining_stops_at_start_terminal_includes_current_stop() {
        let v = sample_vehicle(0);
        assert!(v.is_at_start_terminal());
        assert_eq!(
            v.remaining_stop_ids(),
            vec![StopId(1), StopId(2), StopId(3)]
        );
    }
}
