//! Metrics Aggregator (C6, `spec.md` §4.6): per-route accumulators folded
//! from simulation events, finalized into the report's numeric columns.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;

use crate::catalog::RouteId;

#[derive(Debug, Clone, Default)]
pub struct RouteAccumulator {
    pub sum_journey_stops: u64,
    pub count_journeys: u64,
    pub sum_fullness: u64,
    pub count_fullness_samples: u64,
    pub completed_trips: u32,
}

impl RouteAccumulator {
    pub fn average_journey_stops(&self) -> f64 {
        round2(self.sum_journey_stops as f64 / self.count_journeys.max(1) as f64)
    }

    pub fn average_fullness_pct(&self, capacity: u32) -> f64 {
        let avg_fullness = self.sum_fullness as f64 / self.count_fullness_samples.max(1) as f64;
        round2(avg_fullness / capacity.max(1) as f64 * 100.0)
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, Resource)]
pub struct MetricsAggregator {
    pub per_route: HashMap<RouteId, RouteAccumulator>,
}

impl MetricsAggregator {
    /// Record a boarding passenger's journey length (§4.5.2).
    pub fn record_journey(&mut self, route_id: RouteId, journey_length_stops: usize) {
        let acc = self.per_route.entry(route_id).or_default();
        acc.sum_journey_stops += journey_length_stops as u64;
        acc.count_journeys += 1;
    }

    /// Record how full a vehicle was at the moment it was dispatched.
    pub fn record_fullness_sample(&mut self, route_id: RouteId, passengers_on_board: usize) {
        let acc = self.per_route.entry(route_id).or_default();
        acc.sum_fullness += passengers_on_board as u64;
        acc.count_fullness_samples += 1;
    }

    pub fn record_completed_trip(&mut self, route_id: RouteId) {
        self.per_route.entry(route_id).or_default().completed_trips += 1;
    }

    pub fn total_trips(&self) -> u32 {
        self.per_route.values().map(|a| a.completed_trips).sum()
    }
}
