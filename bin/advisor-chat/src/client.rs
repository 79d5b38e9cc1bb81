//! HTTP client for the two functions, as the chat widget calls them.

use std::time::Duration;

use advisor_core::sse::DeltaDecoder;
use advisor_core::{ChatMessage, InquiryRequest};
use anyhow::{Context, Result, bail};
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FunctionsClient {
    http: reqwest::Client,
    base_url: String,
    publishable_key: String,
}

impl FunctionsClient {
    pub fn new(base_url: &str, publishable_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            publishable_key: publishable_key.to_owned(),
        })
    }

    /// Post the whole conversation and feed each streamed delta to `on_delta`.
    ///
    /// Returns once the stream reports `[DONE]` or the connection closes.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        mut on_delta: impl FnMut(&str),
    ) -> Result<()> {
        let response = self
            .post("chat")
            .json(&json!({ "messages": messages }))
            .send()
            .await
            .context("sending chat request")?;
        let response = ensure_success(response).await?;

        let mut decoder = DeltaDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("reading chat stream")?;
            for delta in decoder.push(&chunk) {
                on_delta(&delta);
            }
            if decoder.is_done() {
                return Ok(());
            }
        }
        for delta in decoder.finish() {
            on_delta(&delta);
        }
        debug!("chat stream closed without [DONE]");
        Ok(())
    }

    pub async fn send_inquiry(&self, inquiry: &InquiryRequest) -> Result<()> {
        let response = self
            .post("send-inquiry")
            .json(inquiry)
            .send()
            .await
            .context("sending inquiry")?;
        ensure_success(response).await?;
        Ok(())
    }

    fn post(&self, function: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{}", self.base_url, function))
            .bearer_auth(&self.publishable_key)
    }
}

/// Turn a non-2xx answer into an error carrying the function's `error` text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| "Failed to get response".to_owned());
    bail!("HTTP {}: {}", status.as_u16(), message)
}
