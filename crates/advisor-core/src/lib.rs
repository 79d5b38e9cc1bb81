//! advisor-core – shared logic behind the chat widget and the edge functions.
//!
//! - [`validation`]: request shape / length checks and XSS screening.
//! - [`rate_limit`]: fixed-window, per-key request limiter.
//! - [`html`]: HTML entity escaping for emails and display.
//! - [`sse`]: incremental decoder for streamed chat-completion deltas.
//! - [`session`]: client-side conversation state.

pub mod html;
pub mod rate_limit;
pub mod session;
pub mod sse;
pub mod types;
pub mod validation;

pub use rate_limit::{RateDecision, RateLimitPolicy, RateLimiter};
pub use types::{ChatMessage, InquiryKind, InquiryRequest, Role};
pub use validation::{FieldError, ValidationErrors};
