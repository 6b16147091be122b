//! Conversation thread bound to one analysed image.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use serde::{Deserialize, Serialize};

/// Assistant text appended when a chat turn fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Append-only message history plus the idle/pending turn state.
///
/// Messages are only ever pushed; a new upload replaces the whole thread.
#[derive(Clone, Debug, Default)]
pub struct ConversationThread {
    messages: Vec<ChatMessage>,
    bound_image_id: Option<i64>,
    pending: bool,
    /// Unsent question text.
    pub draft: String,
}

impl ConversationThread {
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn bound_image_id(&self) -> Option<i64> {
        self.bound_image_id
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn bind(&mut self, image_id: i64) {
        self.bound_image_id = Some(image_id);
    }

    /// Optimistically record the user's question and enter the pending state.
    pub(crate) fn open_turn(&mut self, question: &str) {
        self.messages.push(ChatMessage::user(question));
        self.draft.clear();
        self.pending = true;
    }

    /// Record the reply (or fallback) and return to idle.
    pub(crate) fn close_turn(&mut self, reply: ChatMessage) {
        self.messages.push(reply);
        self.pending = false;
    }
}
