//! Client-side conversation state for the chat widget.
//!
//! Lives only in memory for one chat session. While a reply streams, the
//! last message is an assistant placeholder that grows with each delta; on
//! failure the placeholder is removed again.

use crate::types::{ChatMessage, Role};

/// Opening message shown before the visitor types anything.
pub const GREETING: &str = "Hi! I'm Larry's AI assistant. I can answer questions about AI advisory \
services or help you schedule a free consultation. How can I help you today?";

/// Appended after a contact form was delivered.
pub const INQUIRY_SENT: &str = "Thanks for reaching out! Your message has been sent to Larry. \
He'll get back to you shortly.";

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    streaming: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::with_greeting(GREETING)
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
            streaming: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Append a visitor message. Returns the history to send upstream.
    pub fn push_user(&mut self, content: impl Into<String>) -> &[ChatMessage] {
        self.messages.push(ChatMessage::user(content));
        &self.messages
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Add the empty assistant message that deltas are appended to.
    pub fn begin_reply(&mut self) {
        self.messages.push(ChatMessage::assistant(String::new()));
        self.streaming = true;
    }

    pub fn append_delta(&mut self, delta: &str) {
        if !self.streaming {
            return;
        }
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(delta);
        }
    }

    /// Current text of the reply being streamed.
    pub fn pending_reply(&self) -> Option<&str> {
        self.streaming
            .then(|| self.messages.last().map(|m| m.content.as_str()))
            .flatten()
    }

    pub fn finish_reply(&mut self) {
        self.streaming = false;
    }

    /// Drop the placeholder of a failed reply. No-op when nothing streams.
    pub fn abandon_reply(&mut self) {
        if self.streaming {
            self.messages.pop();
            self.streaming = false;
        }
    }

    /// The conversation as `User: …` / `Assistant: …` lines, used as the
    /// context of a contact request.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|m| m.role)
    }
}
