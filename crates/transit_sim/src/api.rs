//! Wire types for the request/response contract (`spec.md` §6).
//!
//! Plain `serde`-derived structs, one per wire message, in the style of
//! the teacher's sweep-orchestration contract
//! (`sim_serverless_sweep_core::contract`): no hand-rolled JSON parsing,
//! `#[serde(default)]` for optional fields, `BTreeMap` where ordering
//! should be deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::ReportStructure;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRequest {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectionEntry {
    pub busstop_id: u32,
    pub passengers_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BusStopRequest {
    #[serde(default)]
    pub passengers_without_direction: u32,
    #[serde(default)]
    pub directions: Vec<DirectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataToCalculate {
    pub city_id: u32,
    pub routes: Vec<RouteRequest>,
    pub busstops: BTreeMap<String, BusStopRequest>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationRequest {
    pub data_to_calculate: DataToCalculate,
    #[serde(default = "default_true")]
    pub get_timeline: bool,
    #[serde(default)]
    pub seed: Option<i64>,
    /// Opaque identifier assigned by the caller; echoed back unchanged.
    /// The core never mints one itself (SPEC_FULL.md §6, Open Question 4).
    #[serde(default)]
    pub simulation_id: Option<i64>,
}

/// One playback frame, serialized as a `(t_seconds, body)` tuple to match
/// the wire shape in §6.2/§6.3.
pub type TimelineEntry = (u64, crate::frames::FrameBody);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationResponse {
    pub error: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate: Option<Vec<TimelineEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_to_report: Option<ReportStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_id: Option<i64>,
}

impl CalculationResponse {
    pub fn ok(
        report: ReportStructure,
        calculate: Option<Vec<TimelineEntry>>,
        simulation_id: Option<i64>,
    ) -> Self {
        Self {
            error: 0,
            error_message: None,
            stage: None,
            hint: None,
            calculate,
            data_to_report: Some(report),
            simulation_id,
        }
    }

    pub fn err(error: &crate::error::SimError, simulation_id: Option<i64>) -> Self {
        Self {
            error: error.error_code(),
            error_message: Some(error.to_string()),
            stage: Some(error.stage().to_string()),
            hint: error.hint(),
            calculate: None,
            data_to_report: None,
            simulation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserializes_with_defaults() {
        let json = r#"{
            "data_to_calculate": {
                "city_id": 1,
                "routes": [{"id": 10}],
                "busstops": {
                    "1": {"passengers_without_direction": 2, "directions": [{"busstop_id": 2, "passengers_count": 3}]}
                }
            }
        }"#;
        let req: CalculationRequest = serde_json::from_str(json).unwrap();
        assert!(req.get_timeline);
        assert_eq!(req.seed, None);
        assert_eq!(req.data_to_calculate.city_id, 1);
        assert_eq!(
            req.data_to_calculate.busstops["1"].passengers_without_direction,
            2
        );
    }

    #[test]
    fn response_roundtrips_through_json() {
        let resp = CalculationResponse {
            error: 0,
            error_message: None,
            stage: None,
            hint: None,
            calculate: None,
            data_to_report: None,
            simulation_id: Some(7),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: CalculationResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(resp, back);
    }
}
