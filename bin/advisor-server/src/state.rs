//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use advisor_core::RateLimiter;

use crate::config::Config;
use crate::upstream::{Gateway, Mailer};

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Per-IP budget for the chat function.
    pub chat_limiter: Arc<RateLimiter>,
    /// Per-IP budget for the inquiry function.
    pub inquiry_limiter: Arc<RateLimiter>,
    pub gateway: Gateway,
    pub mailer: Mailer,
}

impl AppState {
    /// Wire up limiters and upstream clients from `config`.
    ///
    /// `client` is shared by both upstreams so they reuse one connection pool.
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self {
            chat_limiter: Arc::new(RateLimiter::new(config.chat_rate_limit)),
            inquiry_limiter: Arc::new(RateLimiter::new(config.inquiry_rate_limit)),
            gateway: Gateway::new(client.clone(), &config),
            mailer: Mailer::new(client, &config),
            config: Arc::new(config),
        }
    }
}
