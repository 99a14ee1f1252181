//! Ordered, deduplicated message history.

use crate::message::Message;
use std::collections::HashSet;
use wallet_assistant_core::MessageId;

/// The ordered list of messages exchanged in one session.
///
/// Messages keep arrival order and a message whose ID is already held is
/// ignored. A bounded transcript keeps only its newest `max` messages and
/// forgets the IDs it evicts. Once full it also rejects messages sent
/// before its oldest entry, so replayed history cannot push out newer
/// messages, even after a reload.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    seen: HashSet<MessageId>,
    max: Option<usize>,
}

impl Transcript {
    /// Creates an empty, unbounded transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty transcript holding at most `max` messages when set.
    #[must_use]
    pub fn bounded(max: Option<usize>) -> Self {
        Self {
            max,
            ..Self::default()
        }
    }

    /// Builds a transcript from stored messages, dropping duplicate IDs and
    /// keeping the newest `max` when set.
    #[must_use]
    pub fn from_messages(messages: impl IntoIterator<Item = Message>, max: Option<usize>) -> Self {
        let mut transcript = Self::new();
        for message in messages {
            transcript.append(message);
        }
        if let Some(max) = max {
            transcript.evict_to(max);
        }
        transcript.max = max;
        transcript
    }

    /// Appends a message unless it is already held or predates a full
    /// window, evicting the oldest messages beyond the bound.
    ///
    /// Returns true if the message was added.
    pub fn append(&mut self, message: Message) -> bool {
        if self.seen.contains(&message.id) || self.predates_window(&message) {
            return false;
        }
        self.seen.insert(message.id);
        self.messages.push(message);
        if let Some(max) = self.max {
            self.evict_to(max);
        }
        true
    }

    fn predates_window(&self, message: &Message) -> bool {
        match (self.max, self.messages.first()) {
            (Some(max), Some(oldest)) => {
                self.messages.len() >= max && message.sent_at < oldest.sent_at
            }
            _ => false,
        }
    }

    fn evict_to(&mut self, max: usize) {
        let excess = self.messages.len().saturating_sub(max);
        for evicted in self.messages.drain(..excess) {
            self.seen.remove(&evicted.id);
        }
    }

    /// Returns the messages in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
