//! UI-agnostic message types
//!
//! This module contains the transcript entry types that are shared between
//! the different presentations (compact and rich views) and don't depend on
//! any specific UI framework.

/// Who authored a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A single entry in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    sender: Sender,
    text: String,
    file_name: Option<String>,
    /// Underlying cause of a failed turn. Kept for logs, never rendered.
    diagnostic: Option<String>,
}

impl MessageEntry {
    pub fn user(text: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            file_name,
            diagnostic: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            file_name: None,
            diagnostic: None,
        }
    }

    /// Bot entry for a failed turn: fixed user-facing text plus the cause.
    pub fn bot_error(text: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            file_name: None,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
