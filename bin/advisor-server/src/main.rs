//! advisor-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the shared upstream client, rate limiters and their sweepers.
//! 4. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod email;
mod error;
mod middleware;
mod prompt;
mod routes;
mod state;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: ADVISOR_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "advisor-server starting");
    if cfg.gateway_api_key.is_none() {
        warn!("ADVISOR_GATEWAY_API_KEY is not set; chat requests will fail");
    }
    if cfg.email_api_key.is_none() {
        warn!("ADVISOR_EMAIL_API_KEY is not set; inquiries will fail");
    }

    // ── 3. Shared application state ────────────────────────────────────────────
    let client = reqwest::Client::builder()
        .user_agent(concat!("advisor-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building upstream HTTP client")?;

    let sweep_every = cfg.rate_sweep_interval;
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid ADVISOR_BIND '{}'", cfg.bind_address))?;
    let state = Arc::new(AppState::new(cfg, client));

    let sweepers = [
        state.chat_limiter.spawn_sweeper(sweep_every),
        state.inquiry_limiter.spawn_sweeper(sweep_every),
    ];

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for sweeper in sweepers {
        sweeper.abort();
    }

    info!("advisor-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
