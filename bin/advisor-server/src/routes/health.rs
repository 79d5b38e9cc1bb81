//! Health / heartbeat endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Heartbeat endpoint.
///
/// Always 200 while the process serves requests. `gateway` and `email`
/// report whether the matching API key is set; a function whose key is
/// missing answers every call with a 500.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "gateway": state.gateway.is_configured(),
        "email":   state.mailer.is_configured(),
    }))
}
