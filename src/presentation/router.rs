// Route table for the bridge service
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{cycles, health_check, machine_data};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/machine-data", post(machine_data))
        .route("/cycles", post(cycles))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
