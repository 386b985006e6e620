//! Per-stop simulation state: the waiting queue and last-dispatch bookkeeping
//! used for headway enforcement (§3, §4.5).

use std::collections::{HashMap, VecDeque};

use bevy_ecs::prelude::{Component, Entity, Resource};

use crate::catalog::{RouteId, StopId};
use crate::vehicle::Passenger;

#[derive(Debug, Clone, Component)]
pub struct StopState {
    pub stop_id: StopId,
    /// FIFO by insertion; boarding picks by reachability, not strict order
    /// consumption (a passenger is skipped, not removed, if unreachable).
    pub waiting: VecDeque<Passenger>,
    pub last_dispatch_per_route: HashMap<RouteId, u64>,
    /// Number of passengers waiting here at t=0, cached for the report (§4.6).
    pub initial_passengers_count: usize,
    /// Last simulated second at which this stop still had waiting passengers
    /// in an emitted frame, used to derive `max_waiting_time_min`.
    pub last_seen_nonempty_at: Option<u64>,
}

impl StopState {
    pub fn new(stop_id: StopId) -> Self {
        Self {
            stop_id,
            waiting: VecDeque::new(),
            last_dispatch_per_route: HashMap::new(),
            initial_passengers_count: 0,
            last_seen_nonempty_at: None,
        }
    }
}

/// Lookup table from stop entity, keyed by `StopId`, built once at init.
#[derive(Debug, Clone, Default, Resource)]
pub struct StopIndex {
    pub by_id: HashMap<StopId, Entity>,
}
