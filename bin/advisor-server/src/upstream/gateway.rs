//! LLM gateway client.
//!
//! A completion is a two-step pipeline: [`Gateway::send`] posts the
//! conversation with `stream: true`, then [`classify`] turns the upstream
//! status into either the open response (whose body the caller relays) or a
//! [`GatewayError`]. Nothing is retried.

use advisor_core::ChatMessage;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::prompt::SYSTEM_PROMPT;

/// Longest upstream error body kept for logging.
const MAX_ERROR_BODY: usize = 2048;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI service not configured")]
    NotConfigured,

    /// Upstream answered 429.
    #[error("gateway is rate limiting requests")]
    Busy,

    /// Upstream answered 402 (credits exhausted).
    #[error("gateway requires payment")]
    PaymentRequired,

    /// Any other non-success status.
    #[error("gateway returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One message of the upstream request, system prompt included.
#[derive(Debug, Serialize)]
struct UpstreamMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<UpstreamMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl Gateway {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            url: config.gateway_url.clone(),
            model: config.gateway_model.clone(),
            api_key: config.gateway_api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Open a streamed completion for `messages`.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self.send(messages).await?;
        classify(response).await
    }

    /// Post the conversation, prefixed with the system prompt.
    pub async fn send(&self, messages: &[ChatMessage]) -> Result<reqwest::Response, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::NotConfigured)?;
        let body = self.completion_request(messages);
        debug!(model = %self.model, messages = messages.len(), "forwarding chat to gateway");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }

    fn completion_request<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        let system = UpstreamMessage { role: "system", content: SYSTEM_PROMPT };
        let history = messages.iter().map(|m| UpstreamMessage {
            role: m.role.as_str(),
            content: &m.content,
        });
        CompletionRequest {
            model: &self.model,
            messages: std::iter::once(system).chain(history).collect(),
            stream: true,
        }
    }
}

/// Map an upstream response to the relayable stream or a typed error.
pub async fn classify(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => Err(GatewayError::Busy),
        StatusCode::PAYMENT_REQUIRED => Err(GatewayError::PaymentRequired),
        s => {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
                body.truncate(cut);
            }
            Err(GatewayError::Status { status: s.as_u16(), body })
        }
    }
}
