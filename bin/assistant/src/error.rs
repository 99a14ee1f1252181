//! Error types for the assistant CLI.

use std::fmt;

/// Top-level CLI errors, used as rootcause context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// The messaging transport could not be set up.
    Transport,
    /// The chat session failed.
    Session,
    /// Reading terminal input failed.
    Input,
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "failed to set up messaging transport"),
            Self::Session => write!(f, "chat session failed"),
            Self::Input => write!(f, "failed to read terminal input"),
        }
    }
}

impl std::error::Error for AssistantError {}
