//! Request and response bodies for the HTTP boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::estimate::{HistoryEntry, RankedEstimates};
use crate::pipeline::route::Direction;
use crate::state::StateSnapshot;

/// Inbound reading. The signal vector arrives either as a named mapping of
/// AP identifier to strength or as a list already in vocabulary order;
/// exactly one of the two fields must be present.
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    /// AP identifier → RSSI in dBm.
    #[serde(default)]
    pub rssi: Option<BTreeMap<String, i32>>,
    /// RSSI values in configured AP order.
    #[serde(default)]
    pub rssi_values: Option<Vec<i32>>,
}

/// One ranked prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionDto {
    pub location: String,
    pub probability: f64,
}

/// Response to an inbound reading: ranked predictions, most probable first.
#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<PredictionDto>,
}

impl From<&RankedEstimates> for PredictionsResponse {
    fn from(ranked: &RankedEstimates) -> Self {
        Self {
            predictions: ranked
                .entries()
                .iter()
                .map(|e| PredictionDto {
                    location: e.label.clone(),
                    probability: e.probability,
                })
                .collect(),
        }
    }
}

/// One streamed event: the register version plus its ranked predictions.
#[derive(Debug, Serialize)]
pub struct StreamPayload {
    pub version: u64,
    pub predictions: Vec<PredictionDto>,
}

impl From<&StateSnapshot> for StreamPayload {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            version: snapshot.version,
            predictions: PredictionsResponse::from(&snapshot.estimates).predictions,
        }
    }
}

/// Route request: where the device wants to go.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub destination: String,
}

/// Ordered unit moves from the smoothed current cell to the destination.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: Vec<Direction>,
}

/// Recent fixes, newest first.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: u64,
    pub observers: usize,
}
