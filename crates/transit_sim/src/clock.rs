//! Simulation time: a priority structure of pending events keyed by
//! absolute seconds since run start (C4, `spec.md` §4.4).
//!
//! Mirrors the teacher's `SimulationClock` (min-heap keyed by timestamp,
//! ties broken deterministically) but at second resolution, and with
//! `pop_earliest` returning the *whole* batch of events tied at the
//! smallest timestamp rather than one event at a time, per the Timeline
//! contract: ties are an unordered batch the simulator must handle
//! order-insensitively.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::catalog::RouteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    /// Release vehicle `vehicle_index` (1-based) of `route_id`.
    Dispatch {
        route_id: RouteId,
        vehicle_index: u32,
    },
    /// A vehicle arrives at `polyline[stop_index]`.
    Arrive { vehicle: Entity, stop_index: usize },
}

/// A pending action at absolute time `t` (seconds since run start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub t: u64,
    pub subject: EventSubject,
    /// Insertion order, used only to break ties deterministically.
    seq: u64,
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest (t, seq) pops first.
        other
            .t
            .cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default, Resource)]
pub struct Timeline {
    events: BinaryHeap<Event>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at time `t`. Multiple events may share `t`.
    pub fn schedule(&mut self, t: u64, subject: EventSubject) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event { t, subject, seq });
    }

    /// Remove and return every event tied at the smallest `t`, in insertion order.
    pub fn pop_earliest(&mut self) -> Option<(u64, Vec<Event>)> {
        let first = self.events.pop()?;
        let t = first.t;
        let mut group = vec![first];
        while let Some(next) = self.events.peek() {
            if next.t != t {
                break;
            }
            group.push(self.events.pop().expect("peeked element exists"));
        }
        group.sort_by_key(|e| e.seq);
        Some((t, group))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(route: u32, idx: u32) -> EventSubject {
        EventSubject::Dispatch {
            route_id: RouteId(route),
            vehicle_index: idx,
        }
    }

    #[test]
    fn pops_events_in_time_order() {
        let mut tl = Timeline::new();
        tl.schedule(20, dispatch(1, 1));
        tl.schedule(5, dispatch(1, 2));
        tl.schedule(10, dispatch(1, 3));

        let (t, group) = tl.pop_earliest().unwrap();
        assert_eq!(t, 5);
        assert_eq!(group.len(), 1);

        let (t, _) = tl.pop_earliest().unwrap();
        assert_eq!(t, 10);

        let (t, _) = tl.pop_earliest().unwrap();
        assert_eq!(t, 20);

        assert!(tl.pop_earliest().is_none());
    }

    #[test]
    fn groups_tied_events_in_insertion_order() {
        let mut tl = Timeline::new();
        tl.schedule(5, dispatch(1, 1));
        tl.schedule(5, dispatch(1, 2));
        tl.schedule(5, dispatch(1, 3));
        tl.schedule(6, dispatch(1, 4));

        let (t, group) = tl.pop_earliest().unwrap();
        assert_eq!(t, 5);
        assert_eq!(group.len(), 3);
        assert_eq!(group[0].subject, dispatch(1, 1));
        assert_eq!(group[1].subject, dispatch(1, 2));
        assert_eq!(group[2].subject, dispatch(1, 3));

        assert!(tl.is_empty() == false);
        let (t, group) = tl.pop_earliest().unwrap();
        assert_eq!(t, 6);
        assert_eq!(group.len(), 1);
        assert!(tl.is_empty());
    }
}
