//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - the two functions (`chat`, `send-inquiry`), each with its own CORS
//!   policy, mounted under both `/functions` and `/functions/v1`
//! - `/out` external redirect
//! - `/health` heartbeat
//! - `/api-docs/openapi.json`
//! - per-request trace middleware around everything

mod chat;
pub mod doc;
mod health;
mod inquiry;
mod redirect;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router, middleware};
use tower::ServiceBuilder;

use crate::middleware::trace;
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let functions = Router::new()
        .merge(chat::router())
        .merge(inquiry::router(&state.config));

    Router::new()
        .nest("/functions", functions.clone())
        .nest("/functions/v1", functions)
        .merge(health::router())
        .merge(redirect::router())
        .route("/api-docs/openapi.json", get(|| async { Json(doc::get_docs()) }))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(trace::trace_middleware)))
        .with_state(state)
}

/// Key used for per-IP rate limiting.
///
/// First `X-Forwarded-For` hop, else `X-Real-IP`, else `"unknown"`; every
/// caller without either header shares one bucket.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded.or_else(real_ip).unwrap_or("unknown").to_owned()
}
