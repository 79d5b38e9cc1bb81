//! Input validation shared by the chat widget and the edge functions.
//!
//! Every request shape has one explicit validation entry point that returns
//! either the normalized value or a typed error:
//!
//! | shape | side | entry point |
//! |-------|------|-------------|
//! | single chat message | client | [`validate_chat_input`] |
//! | contact form | client | [`ContactForm::validate`] |
//! | chat history | server | [`validate_conversation`] |
//! | inquiry | server | [`InquiryRequest::from_value`] |
//!
//! Client checks collect every failing field; server checks stop at the first
//! failure so the response carries a single message.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{ChatMessage, InquiryKind, InquiryRequest, Role};


/// Longest chat message the widget will send.
pub const CLIENT_MESSAGE_MAX_CHARS: usize = 2000;
/// Longest single message the chat function will forward.
pub const SERVER_MESSAGE_MAX_CHARS: usize = 4000;
/// Longest conversation the chat function will forward.
pub const MAX_CONVERSATION_MESSAGES: usize = 50;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const INQUIRY_MESSAGE_MAX_CHARS: usize = 2000;
pub const CONTEXT_MAX_CHARS: usize = 10_000;

const INVALID_CHARACTERS: &str = "Invalid characters detected";

/// Markup and URI schemes that can execute script when rendered.
static XSS_SIGNATURES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"<\s*/?\s*script",
        r"|\bjavascript\s*:",
        r"|\bvbscript\s*:",
        r"|\bdata\s*:\s*text/html",
        r"|\bon\w+=",
        r"|<[^>]*\bon\w+\s*=",
        r"|<\s*(?:iframe|object|embed|form)\b",
        r"|\bexpression\s*\(",
    ))
    .expect("XSS signature pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

// ── Errors ───────────────────────────────────────────────────────────────────

/// A single rejected field together with a message suitable for end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Every field error found in one input, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn first(&self) -> &FieldError {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Error for `field`, if that field failed.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.first().message)
    }
}

// ── Primitive checks ─────────────────────────────────────────────────────────

/// `true` if `text` carries script tags, inline event handlers, scriptable
/// URI schemes or embedding elements.
pub fn contains_xss(text: &str) -> bool {
    XSS_SIGNATURES.is_match(text)
}

/// Loose `local@domain.tld` check.
pub fn is_valid_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Trim, require 1..=`max` chars, optionally screen for markup.
fn bounded_text(
    field: &'static str,
    raw: &str,
    max: usize,
    empty: &'static str,
    too_long: &'static str,
    screen: bool,
) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, empty));
    }
    if char_len(trimmed) > max {
        return Err(FieldError::new(field, too_long));
    }
    if screen && contains_xss(trimmed) {
        return Err(FieldError::new(field, INVALID_CHARACTERS));
    }
    Ok(trimmed.to_owned())
}

// ── Client side ──────────────────────────────────────────────────────────────

/// Validate one message typed into the chat widget. Returns the trimmed text.
pub fn validate_chat_input(content: &str) -> Result<String, FieldError> {
    bounded_text(
        "content",
        content,
        CLIENT_MESSAGE_MAX_CHARS,
        "Message cannot be empty",
        "Message must be less than 2000 characters",
        true,
    )
}

/// The contact form shown inside the chat widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Check every field, returning the trimmed form or all field errors.
    pub fn validate(self) -> Result<ContactForm, ValidationErrors> {
        let mut errors = Vec::new();

        let name = bounded_text(
            "name",
            &self.name,
            NAME_MAX_CHARS,
            "Name is required",
            "Name must be less than 100 characters",
            true,
        )
        .map_err(|e| errors.push(e))
        .ok();

        let email = {
            let trimmed = self.email.trim();
            if !is_valid_email(trimmed) {
                errors.push(FieldError::new("email", "Please enter a valid email address"));
                None
            } else if char_len(trimmed) > EMAIL_MAX_CHARS {
                errors.push(FieldError::new("email", "Email must be less than 255 characters"));
                None
            } else {
                Some(trimmed.to_owned())
            }
        };

        let message = bounded_text(
            "message",
            &self.message,
            INQUIRY_MESSAGE_MAX_CHARS,
            "Message is required",
            "Message must be less than 2000 characters",
            true,
        )
        .map_err(|e| errors.push(e))
        .ok();

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => Ok(ContactForm { name, email, message }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

// ── Server side ──────────────────────────────────────────────────────────────

/// Validate the `messages` field of a chat function body.
///
/// `messages` is `None` when the body has no such field (or is not an
/// object). Content is forwarded verbatim: no trimming, no screening.
pub fn validate_conversation(messages: Option<&Value>) -> Result<Vec<ChatMessage>, FieldError> {
    const FIELD: &str = "messages";

    let Some(items) = messages.and_then(Value::as_array) else {
        return Err(FieldError::new(FIELD, "Messages must be an array"));
    };
    if items.is_empty() {
        return Err(FieldError::new(FIELD, "At least one message is required"));
    }
    if items.len() > MAX_CONVERSATION_MESSAGES {
        return Err(FieldError::new(FIELD, "Too many messages in conversation"));
    }

    items
        .iter()
        .map(|item| {
            let Some(obj) = item.as_object() else {
                return Err(FieldError::new(FIELD, "Invalid message format"));
            };
            let role = obj
                .get("role")
                .and_then(Value::as_str)
                .and_then(Role::parse)
                .ok_or(FieldError::new("role", "Invalid message role"))?;
            let content = obj
                .get("content")
                .and_then(Value::as_str)
                .ok_or(FieldError::new("content", "Message content must be a string"))?;
            if char_len(content) > SERVER_MESSAGE_MAX_CHARS {
                return Err(FieldError::new("content", "Message content too long"));
            }
            Ok(ChatMessage { role, content: content.to_owned() })
        })
        .collect()
}

impl InquiryRequest {
    /// Validate an arbitrary JSON body posted to `send-inquiry`.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub fn from_value(body: &Value) -> Result<InquiryRequest, FieldError> {
        let Some(obj) = body.as_object() else {
            return Err(FieldError::new("body", "Invalid request body"));
        };
        let text = |key: &str| obj.get(key).and_then(Value::as_str);

        let kind = text("type")
            .and_then(InquiryKind::parse)
            .ok_or(FieldError::new("type", "Invalid inquiry type"))?;

        let name = bounded_text(
            "name",
            text("name").unwrap_or_default(),
            NAME_MAX_CHARS,
            "Name is required",
            "Name must be less than 100 characters",
            false,
        )?;

        let email = text("email")
            .ok_or(FieldError::new("email", "Email is required"))?
            .trim();
        if !is_valid_email(email) {
            return Err(FieldError::new("email", "Invalid email address"));
        }
        if char_len(email) > EMAIL_MAX_CHARS {
            return Err(FieldError::new("email", "Email must be less than 255 characters"));
        }

        let message = bounded_text(
            "message",
            text("message").unwrap_or_default(),
            INQUIRY_MESSAGE_MAX_CHARS,
            "Message is required",
            "Message must be less than 2000 characters",
            false,
        )?;

        let context = match obj.get("context") {
            None => None,
            Some(Value::String(s)) if char_len(s) > CONTEXT_MAX_CHARS => {
                return Err(FieldError::new("context", "Context too long"));
            }
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(FieldError::new("context", "Invalid context format")),
        };

        if contains_xss(&name) {
            return Err(FieldError::new("name", INVALID_CHARACTERS));
        }
        if contains_xss(&message) {
            return Err(FieldError::new("message", INVALID_CHARACTERS));
        }

        Ok(InquiryRequest {
            kind,
            name,
            email: email.to_lowercase(),
            message,
            context,
        })
    }
}
