//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use advisor_core::RateLimitPolicy;

/// Runtime configuration for advisor-server.
///
/// Every field except the two API keys has a default, so the server starts
/// without any environment set. Missing keys are reported per request.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Chat-completions endpoint of the LLM gateway.
    pub gateway_url: String,

    /// Model identifier sent with every completion request.
    pub gateway_model: String,

    /// Bearer key for the gateway. Secret.
    pub gateway_api_key: Option<String>,

    /// Transactional email endpoint.
    pub email_api_url: String,

    /// Bearer key for the email API. Secret.
    pub email_api_key: Option<String>,

    /// `From:` of inquiry emails.
    pub email_from: String,

    /// Inbox inquiries are delivered to.
    pub email_to: String,

    /// Origins allowed to call `send-inquiry` from a browser.
    pub inquiry_origins: Vec<String>,

    /// Per-IP limit on the chat function.
    pub chat_rate_limit: RateLimitPolicy,

    /// Per-IP limit on the inquiry function.
    pub inquiry_rate_limit: RateLimitPolicy,

    /// How often expired rate-limit records are dropped.
    pub rate_sweep_interval: Duration,

    /// Largest accepted inquiry body in bytes.
    pub max_inquiry_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: env_or("ADVISOR_BIND", "0.0.0.0:3000"),
            log_level: env_or("ADVISOR_LOG", "info"),
            log_json: lookup("ADVISOR_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            gateway_url: env_or(
                "ADVISOR_GATEWAY_URL",
                "https://ai.gateway.lovable.dev/v1/chat/completions",
            ),
            gateway_model: env_or("ADVISOR_GATEWAY_MODEL", "google/gemini-3-flash-preview"),
            gateway_api_key: secret("ADVISOR_GATEWAY_API_KEY"),
            email_api_url: env_or("ADVISOR_EMAIL_API_URL", "https://api.resend.com/emails"),
            email_api_key: secret("ADVISOR_EMAIL_API_KEY"),
            email_from: env_or("ADVISOR_EMAIL_FROM", "AI Advisor Chatbot <onboarding@resend.dev>"),
            email_to: env_or("ADVISOR_EMAIL_TO", "salinasaiconsulting@outlook.com"),
            inquiry_origins: split_list(&env_or(
                "ADVISOR_CORS_ORIGINS",
                "https://salinas-ai-consulting.com,https://www.salinas-ai-consulting.com",
            )),
            chat_rate_limit: RateLimitPolicy::new(
                parse_or(&lookup, "ADVISOR_CHAT_RATE_LIMIT", 30),
                Duration::from_secs(parse_or(&lookup, "ADVISOR_CHAT_RATE_WINDOW_SECS", 60)),
            ),
            inquiry_rate_limit: RateLimitPolicy::new(
                parse_or(&lookup, "ADVISOR_INQUIRY_RATE_LIMIT", 5),
                Duration::from_secs(parse_or(&lookup, "ADVISOR_INQUIRY_RATE_WINDOW_SECS", 300)),
            ),
            rate_sweep_interval: Duration::from_secs(
                parse_or(&lookup, "ADVISOR_RATE_SWEEP_SECS", 120).max(1),
            ),
            max_inquiry_bytes: parse_or(&lookup, "ADVISOR_MAX_INQUIRY_BYTES", 20 * 1024),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
