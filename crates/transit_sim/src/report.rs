//! Report structure (§6.3) and its construction from the finished run's
//! metrics and catalog data.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::geodesy::{distance_km, GeoPoint};
use crate::metrics::{round2, MetricsAggregator};
use crate::scenario::SimInput;
use crate::stopstate::StopState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusStopReportRow {
    pub bus_name: String,
    pub initial_passengers_count: usize,
    pub max_waiting_time_min: u64,
    pub routes_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteReportRow {
    pub name: String,
    pub vehicle_type_label: String,
    pub interval: u32,
    pub average_journey_stops: f64,
    pub average_fullness_pct: String,
    pub stop_count: usize,
    pub route_length_km: f64,
    pub vehicle_count: u32,
    pub completed_trips: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportStructure {
    pub city_name: String,
    pub data: String,
    pub bus_stops: Vec<BusStopReportRow>,
    pub routes: Vec<RouteReportRow>,
    pub total_trips_count: u32,
}

/// ISO-8601 timestamp with seconds precision, colons replaced by `-` (§6.3).
fn report_timestamp() -> String {
    Utc::now()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
        .replace(':', "-")
}

pub fn build_report(
    catalog: &Catalog,
    input: &SimInput,
    metrics: &MetricsAggregator,
    stop_states: &[StopState],
) -> ReportStructure {
    let city_name = catalog
        .city(input.city_id)
        .map(|c| c.name.clone())
        .unwrap_or_default();

    let mut bus_stops = Vec::new();
    let mut sum_initial = 0usize;
    let mut waiting_time_sum = 0u64;
    let mut waiting_time_count = 0u64;

    let mut sorted_stops: Vec<&StopState> = stop_states.iter().collect();
    sorted_stops.sort_by_key(|s| s.stop_id.0);

    for stop_state in &sorted_stops {
        let Some(stop) = input.stops_indexed.get(&stop_state.stop_id) else {
            continue;
        };
        let routes_count = input
            .routes
            .iter()
            .filter(|r| r.busstops.contains(&stop_state.stop_id))
            .count() as u32;
        let max_waiting_time_min = stop_state
            .last_seen_nonempty_at
            .map(|t| (t as f64 / 60.0).round() as u64)
            .unwrap_or(0);

        sum_initial += stop_state.initial_passengers_count;
        if stop_state.last_seen_nonempty_at.is_some() {
            waiting_time_sum += max_waiting_time_min;
            waiting_time_count += 1;
        }

        bus_stops.push(BusStopReportRow {
            bus_name: stop.name.clone(),
            initial_passengers_count: stop_state.initial_passengers_count,
            max_waiting_time_min,
            routes_count,
        });
    }

    bus_stops.push(BusStopReportRow {
        bus_name: "Total".to_string(),
        initial_passengers_count: sum_initial,
        max_waiting_time_min: if waiting_time_count > 0 {
            (waiting_time_sum as f64 / waiting_time_count as f64).round() as u64
        } else {
            0
        },
        routes_count: 0,
    });

    let mut routes = Vec::new();
    let mut sorted_routes: Vec<&crate::catalog::Route> = input.routes.iter().collect();
    sorted_routes.sort_by_key(|r| r.id.0);

    for route in &sorted_routes {
        let acc = metrics.per_route.get(&route.id).cloned().unwrap_or_default();
        let capacity = route
            .vehicle_type_id
            .and_then(|id| catalog.vehicle_type(id))
            .map(|vt| vt.capacity)
            .unwrap_or(1);
        let vehicle_type_label = route
            .vehicle_type_id
            .and_then(|id| catalog.vehicle_type(id))
            .map(|vt| vt.name.clone())
            .unwrap_or_default();

        let route_length_km = round2(
            route
                .list_coord
                .windows(2)
                .map(|w| distance_km(GeoPoint::new(w[0].lat, w[0].lon), GeoPoint::new(w[1].lat, w[1].lon)))
                .sum(),
        );

        routes.push(RouteReportRow {
            name: route.name.clone(),
            vehicle_type_label,
            interval: route.interval_min,
            average_journey_stops: acc.average_journey_stops(),
            average_fullness_pct: format!("{}%", acc.average_fullness_pct(capacity)),
            stop_count: route.busstops.len(),
            route_length_km,
            vehicle_count: route.amount.unwrap_or(0),
            completed_trips: acc.completed_trips,
        });
    }

    ReportStructure {
        city_name,
        data: report_timestamp(),
        bus_stops,
        routes,
        total_trips_count: metrics.total_trips(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_roundtrips_through_json() {
        let report = ReportStructure {
            city_name: "X".into(),
            data: "2026-01-01T00-00-00".into(),
            bus_stops: vec![],
            routes: vec![],
            total_trips_count: 3,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ReportStructure = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn timestamp_has_no_colons() {
        let ts = report_timestamp();
        assert!(!ts.contains(':'));
    }
}
