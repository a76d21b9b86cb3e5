//! Liveness endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::application::EngagementSupervisor;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub running_schedulers: usize,
}

/// GET /health
async fn health(State(supervisor): State<Arc<EngagementSupervisor>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        running_schedulers: supervisor.running_tenants().await.len(),
    })
}

pub fn health_routes(supervisor: Arc<EngagementSupervisor>) -> Router {
    Router::new().route("/health", get(health)).with_state(supervisor)
}
