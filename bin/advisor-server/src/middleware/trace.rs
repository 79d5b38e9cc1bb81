use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// Wrap each request in an `http_request` span and echo its trace id.
///
/// Bodies pass through untouched: the chat relay streams its response, so
/// nothing here may collect it.
pub async fn trace_middleware(mut req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    // Reuse the caller's id when it is a valid uuid.
    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let header_value = HeaderValue::from_str(&trace_id.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid"));

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        req.headers_mut().insert(X_TRACE_ID, header_value.clone());

        let mut response = next.run(req).await;
        response.headers_mut().insert(X_TRACE_ID, header_value);

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response headers sent"
        );
        response
    }
    .instrument(span)
    .await
}
