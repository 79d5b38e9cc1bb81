//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a `{"error": "..."}`
//! JSON body with an appropriate status code.
//!
//! Upstream and internal failures are logged with full detail; the caller
//! only ever sees one of a few fixed messages.

use advisor_core::FieldError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::upstream::{GatewayError, MailError};

const GENERIC_ERROR: &str = "An error occurred. Please try again.";

/// All errors that can occur in the advisor-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller exceeded its fixed-window budget.
    #[error("rate limited for {retry_after_secs}s")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Declared or actual body size above the configured cap.
    #[error("request body too large")]
    PayloadTooLarge,

    #[error("method not allowed")]
    MethodNotAllowed,

    /// Propagated from the LLM gateway client.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Propagated from the email API client.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::RateLimited { message, retry_after_secs } => {
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": message }))).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
                return response;
            }
            ServerError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_owned())
            }
            ServerError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
            }

            // Upstream errors: fixed messages, detail stays in the logs.
            ServerError::Gateway(e) => match e {
                GatewayError::Busy => {
                    warn!("AI gateway rate limited the request");
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        "Service is busy. Please try again in a moment.".to_owned(),
                    )
                }
                GatewayError::PaymentRequired => {
                    warn!("AI gateway requires payment");
                    (StatusCode::PAYMENT_REQUIRED, "Service temporarily unavailable.".to_owned())
                }
                GatewayError::Status { status, body } => {
                    error!(status, body = %body, "AI gateway error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Unable to process your request".to_owned(),
                    )
                }
                GatewayError::NotConfigured | GatewayError::Transport(_) => {
                    error!(error = %e, "chat error");
                    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR.to_owned())
                }
            },
            ServerError::Mail(e) => {
                error!(error = %e, "error in send-inquiry");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to process your request. Please try again.".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR.to_owned())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<FieldError> for ServerError {
    fn from(e: FieldError) -> Self {
        ServerError::BadRequest(e.message.to_owned())
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}
