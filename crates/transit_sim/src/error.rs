//! Typed errors for the simulation pipeline.
//!
//! Every error carries enough information for a caller to build a
//! `CalculationResponse` (`error` code, `stage`, and a human-readable hint)
//! without re-deriving it from the error's `Display` text.

use std::fmt;

/// Pipeline stage at which an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    DataPreparation,
    Calculation,
    ReportGeneration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validation => "validation",
            Stage::DataPreparation => "data_preparation",
            Stage::Calculation => "calculation",
            Stage::ReportGeneration => "report_generation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown city {0}")]
    UnknownCity(u32),

    #[error("no routes resolved for city {city_id}")]
    NoRoutes { city_id: u32 },

    #[error("no passenger demand remained after filtering")]
    NoDemand,

    #[error("route {route_id} has no vehicle type or no fleet")]
    NoFleet { route_id: u32 },

    #[error("polyline point ({lat}, {lon}) on route {route_id} matches no stop within tolerance")]
    UnresolvablePolylinePoint {
        route_id: u32,
        lat: f64,
        lon: f64,
    },

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolated(String),

    #[error("report generation failed: {0}")]
    ReportFailure(String),
}

impl SimError {
    pub fn stage(&self) -> Stage {
        match self {
            SimError::InvalidInput(_) | SimError::UnknownCity(_) => Stage::Validation,
            SimError::NoRoutes { .. } | SimError::NoDemand => Stage::DataPreparation,
            SimError::NoFleet { .. }
            | SimError::UnresolvablePolylinePoint { .. }
            | SimError::InternalInvariantViolated(_) => Stage::Calculation,
            SimError::ReportFailure(_) => Stage::ReportGeneration,
        }
    }

    /// `CalculationResponse.error` code: 1 for input/data-preparation
    /// failures the caller can fix by editing the request, 2 for failures
    /// that surface only once calculation has started.
    pub fn error_code(&self) -> u8 {
        match self {
            SimError::InvalidInput(_)
            | SimError::UnknownCity(_)
            | SimError::NoRoutes { .. }
            | SimError::NoDemand => 1,
            SimError::NoFleet { .. }
            | SimError::UnresolvablePolylinePoint { .. }
            | SimError::InternalInvariantViolated(_)
            | SimError::ReportFailure(_) => 2,
        }
    }

    /// A human-readable suggestion, when one is obvious from the failure mode.
    pub fn hint(&self) -> Option<String> {
        match self {
            SimError::NoRoutes { .. } => {
                Some("check that the requested route ids exist in this city".to_string())
            }
            SimError::NoDemand => Some(
                "at least one stop must have passengers bound for a reachable destination"
                    .to_string(),
            ),
            SimError::NoFleet { route_id } => Some(format!(
                "specify vehicle type and fleet size for route {route_id}"
            )),
            SimError::UnresolvablePolylinePoint { route_id, .. } => Some(format!(
                "route {route_id}'s polyline has a point that does not match any of its stops"
            )),
            _ => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
