//! Wire types shared by the functions and the chat client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ── Chat ─────────────────────────────────────────────────────────────────────

/// Author of a chat message. The system prompt is added server-side and is
/// never accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when a conversation is flattened into plain text.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// `"user"` or `"assistant"`.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ── Inquiry ──────────────────────────────────────────────────────────────────

/// What the visitor is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InquiryKind {
    Question,
    Consultation,
}

impl InquiryKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "question" => Some(InquiryKind::Question),
            "consultation" => Some(InquiryKind::Consultation),
            _ => None,
        }
    }

    /// Prefix of the email subject line.
    pub fn subject_prefix(self) -> &'static str {
        match self {
            InquiryKind::Consultation => "Consultation Request",
            InquiryKind::Question => "Question",
        }
    }

    /// Heading at the top of the email body.
    pub fn heading(self) -> &'static str {
        match self {
            InquiryKind::Consultation => "New Consultation Request",
            InquiryKind::Question => "New Question",
        }
    }

    /// Human label shown next to "Type:".
    pub fn label(self) -> &'static str {
        match self {
            InquiryKind::Consultation => "Consultation Request",
            InquiryKind::Question => "General Question",
        }
    }
}

/// A contact request as accepted by `send-inquiry`.
///
/// Instances produced by [`InquiryRequest::from_value`] are already trimmed,
/// bounded and screened; the email is lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InquiryRequest {
    #[serde(rename = "type")]
    pub kind: InquiryKind,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Flattened chat transcript, if the inquiry came from the chat widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}
