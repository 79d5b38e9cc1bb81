//! Transactional email client.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("email API returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A rendered message ready to hand to the email API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    /// Replies go to the visitor, not to the sending address.
    pub reply_to: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    reply_to: &'a str,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
    to: String,
}

impl Mailer {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
            to: config.email_to.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;
        let body = SendEmailRequest {
            from: &self.from,
            to: [&self.to],
            subject: &message.subject,
            html: &message.html,
            reply_to: &message.reply_to,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Status { status: status.as_u16(), body });
        }

        info!(status = status.as_u16(), "inquiry email accepted");
        Ok(())
    }
}
