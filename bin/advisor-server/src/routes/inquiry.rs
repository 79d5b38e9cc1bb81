//! Inquiry function: validate a contact/consultation request and email it.

use std::sync::Arc;

use advisor_core::{InquiryRequest, RateDecision};
use anyhow::Context;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::config::Config;
use crate::email::render_inquiry;
use crate::error::ServerError;
use crate::middleware::cors;
use crate::routes::client_ip;
use crate::state::AppState;
use crate::upstream::MailError;

#[derive(OpenApi)]
#[openapi(paths(send_inquiry), components(schemas(InquiryRequest)))]
pub struct InquiryApi;

pub fn router(config: &Config) -> Router<Arc<AppState>> {
    Router::new()
        .route("/send-inquiry", post(send_inquiry).fallback(method_not_allowed))
        .layer(cors::inquiry_cors(config))
}

/// Email a visitor's question or consultation request
/// (`POST /functions/send-inquiry`).
#[utoipa::path(
    post,
    path = "/functions/send-inquiry",
    tag = "functions",
    request_body = InquiryRequest,
    responses(
        (status = 200, description = "Inquiry delivered", body = Value),
        (status = 400, description = "Invalid JSON or field"),
        (status = 405, description = "Method not allowed"),
        (status = 413, description = "Request body too large"),
        (status = 429, description = "Per-IP limit exceeded"),
        (status = 500, description = "Email service unavailable"),
    )
)]
pub async fn send_inquiry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>, ServerError> {
    let ip = client_ip(&headers);
    if let RateDecision::Limited { retry_after_secs } = state.inquiry_limiter.check(&ip) {
        warn!(%ip, retry_after_secs, "inquiry rate limit exceeded");
        return Err(ServerError::RateLimited {
            message: format!("Too many requests. Try again in {retry_after_secs} seconds."),
            retry_after_secs,
        });
    }

    if !state.mailer.is_configured() {
        return Err(MailError::NotConfigured.into());
    }

    let max = state.config.max_inquiry_bytes;
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|len| len > max as u64) {
        return Err(ServerError::PayloadTooLarge);
    }
    let bytes = axum::body::to_bytes(body, max).await.map_err(|e| {
        debug!(error = %e, "inquiry body rejected while reading");
        ServerError::PayloadTooLarge
    })?;

    let payload: Value = serde_json::from_slice(&bytes)
        .map_err(|_| ServerError::BadRequest("Invalid JSON".into()))?;
    let inquiry = InquiryRequest::from_value(&payload)?;

    let email = render_inquiry(&inquiry).context("rendering inquiry email")?;
    state.mailer.send(&email).await?;
    info!(kind = ?inquiry.kind, "inquiry delivered");

    Ok(Json(json!({ "success": true })))
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
