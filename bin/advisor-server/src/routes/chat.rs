//! Chat function: validate the conversation, then relay the gateway's SSE
//! stream back to the caller byte for byte.

use std::sync::Arc;

use advisor_core::validation::validate_conversation;
use advisor_core::{ChatMessage, RateDecision};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::Value;
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::cors;
use crate::routes::client_ip;
use crate::state::AppState;

/// Largest accepted chat body: a full conversation of maximum-length
/// messages fits with room to spare.
const MAX_CHAT_BODY_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatMessage)))]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .layer(cors::chat_cors())
}

/// Stream an assistant reply for a conversation (`POST /functions/chat`).
///
/// The body is `{"messages": [ChatMessage, ...]}`; the response is the
/// gateway's `text/event-stream`, unmodified.
#[utoipa::path(
    post,
    path = "/functions/chat",
    tag = "functions",
    request_body(content = Value, description = "`{\"messages\": [{\"role\", \"content\"}]}`"),
    responses(
        (status = 200, description = "Chat-completion delta stream", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Invalid JSON or conversation"),
        (status = 402, description = "Gateway credits exhausted"),
        (status = 413, description = "Request body too large"),
        (status = 429, description = "Per-IP limit or gateway busy"),
        (status = 500, description = "Gateway failure"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ServerError> {
    let ip = client_ip(&headers);
    if let RateDecision::Limited { retry_after_secs } = state.chat_limiter.check(&ip) {
        warn!(%ip, retry_after_secs, "chat rate limit exceeded");
        return Err(ServerError::RateLimited {
            message: format!("Rate limit exceeded. Please try again in {retry_after_secs} seconds."),
            retry_after_secs,
        });
    }

    let body = axum::body::to_bytes(body, MAX_CHAT_BODY_BYTES).await.map_err(|e| {
        debug!(error = %e, "chat body rejected while reading");
        ServerError::PayloadTooLarge
    })?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ServerError::BadRequest("Invalid JSON".into()))?;
    let messages = validate_conversation(payload.get("messages"))?;

    let upstream = state.gateway.stream_chat(&messages).await?;
    info!(messages = messages.len(), "relaying gateway stream");

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}
