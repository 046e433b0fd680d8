// HTTP request handlers
use crate::domain::cycle::Cycle;
use crate::domain::error::BridgeError;
use crate::domain::request::{CycleRequest, MachineDataRequest};
use crate::domain::telemetry::MachineData;
use crate::presentation::app_state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Sensor data for one or more nodes, as records or a wide table
pub async fn machine_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MachineDataRequest>,
) -> Result<Json<MachineData>, BridgeError> {
    let data = state.machine_data_service.get_machine_data(request).await?;
    Ok(Json(data))
}

/// Production cycles detected from a machine's counter signal
pub async fn cycles(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CycleRequest>,
) -> Result<Json<Vec<Cycle>>, BridgeError> {
    let cycles = state.machine_data_service.get_cycle_starts(request).await?;
    Ok(Json(cycles))
}
