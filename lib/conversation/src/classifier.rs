//! Intent classification of inbound chat text.
//!
//! Two classifiers exist and are selected explicitly. `Loose` is the
//! keyword heuristic of the simulated assistant: any mention of "balance",
//! or text starting with "send". `Strict` runs the full command grammar.
//! They disagree on purpose ("send 5 to bob" is a send for `Loose` and
//! unrecognized for `Strict`), so they are never mixed.

use serde::{Deserialize, Serialize};
use wallet_assistant_command::{ParsedCommand, parse};

/// Which classifier a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Substring/prefix keyword heuristic.
    #[default]
    Loose,
    /// Full command grammar.
    Strict,
}

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Loose match: the text mentions a balance.
    Balance,
    /// Loose match: the text starts with "send".
    Send,
    /// Strict match: a fully parsed command.
    Command(ParsedCommand),
    /// Nothing matched.
    Unrecognized,
}

/// Classifies `text` with the given classifier.
#[must_use]
pub fn classify(mode: ClassifierMode, text: &str) -> Intent {
    match mode {
        ClassifierMode::Loose => classify_loose(text),
        ClassifierMode::Strict => parse(text).map_or(Intent::Unrecognized, Intent::Command),
    }
}

fn classify_loose(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if lower.contains("balance") {
        Intent::Balance
    } else if lower.starts_with("send") {
        Intent::Send
    } else {
        Intent::Unrecognized
    }
}
