//! Clients for the two third-party services the functions depend on.
//!
//! - [`gateway`]: OpenAI-compatible LLM gateway, streamed.
//! - [`mailer`]: transactional email API.

pub mod gateway;
pub mod mailer;

pub use gateway::{Gateway, GatewayError};
pub use mailer::{EmailMessage, MailError, Mailer};
