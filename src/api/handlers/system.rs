use axum::{extract::State, Json};

use crate::api::{
    state::AppState,
    types::{HealthResponse, ServiceInfo},
};

/// GET / -- static service metadata
pub async fn home() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// GET /health -- lightweight liveness probe
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let schema = state.predictor.schema();
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_seconds(),
        features: schema.dim(),
        headline_target: schema.headline_target.clone(),
    })
}
