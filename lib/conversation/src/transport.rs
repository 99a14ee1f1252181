//! Messaging transport abstraction.
//!
//! A transport opens a conversation with a counterparty, returns its
//! history, streams newly arrived messages, and delivers outbound text.
//! The session never retries transport failures; they propagate to the
//! caller.

use crate::error::TransportError;
use crate::message::Message;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, instrument};
use wallet_assistant_core::{Address, ConversationId};

/// Inbound messages of one conversation, in arrival order.
///
/// The stream ends only when the transport closes the conversation.
pub type MessageStream = BoxStream<'static, Result<Message, TransportError>>;

/// Handle to an open conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHandle {
    /// Transport-assigned conversation identifier.
    pub id: ConversationId,
    /// The other party of the conversation.
    pub counterparty: Address,
}

impl ConversationHandle {
    /// Creates a handle for a conversation with `counterparty`.
    #[must_use]
    pub fn new(counterparty: Address) -> Self {
        Self {
            id: ConversationId::new(),
            counterparty,
        }
    }
}

/// Trait for messaging transports.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Opens a conversation with `counterparty`.
    async fn connect(&self, counterparty: &Address) -> Result<ConversationHandle, TransportError>;

    /// Returns the messages exchanged so far.
    async fn history(&self, handle: &ConversationHandle) -> Result<Vec<Message>, TransportError>;

    /// Subscribes to messages arriving after this call.
    async fn subscribe(&self, handle: &ConversationHandle) -> Result<MessageStream, TransportError>;

    /// Sends `content` as the local participant and returns the sent message.
    async fn send(
        &self,
        handle: &ConversationHandle,
        content: &str,
    ) -> Result<Message, TransportError>;
}

/// Capacity of each loopback conversation channel.
const LOOPBACK_CHANNEL_CAPACITY: usize = 256;

struct LoopbackConversation {
    history: Vec<Message>,
    sender: broadcast::Sender<Message>,
}

/// In-process transport that echoes every sent message to subscribers.
///
/// Conversations are keyed by counterparty and live as long as the
/// transport. Clones share the same conversations, so one clone can inject
/// counterparty messages with [`LoopbackTransport::deliver`] while a
/// session listens on another.
#[derive(Clone)]
pub struct LoopbackTransport {
    local: Address,
    conversations: Arc<Mutex<HashMap<Address, LoopbackConversation>>>,
}

impl LoopbackTransport {
    /// Creates a transport sending as `local`.
    #[must_use]
    pub fn new(local: Address) -> Self {
        Self {
            local,
            conversations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Delivers a message into the conversation with `counterparty`.
    ///
    /// The message is appended to history and published to subscribers.
    pub fn deliver(&self, counterparty: &Address, message: Message) {
        let mut conversations = self.lock();
        let conversation = Self::entry(&mut conversations, counterparty);
        conversation.history.push(message.clone());
        // No subscribers yet is fine; history still holds the message.
        let _ = conversation.sender.send(message);
    }

    /// Drops a conversation, ending every open subscription to it.
    pub fn close(&self, counterparty: &Address) {
        self.lock().remove(counterparty);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Address, LoopbackConversation>> {
        self.conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn entry<'a>(
        conversations: &'a mut HashMap<Address, LoopbackConversation>,
        counterparty: &Address,
    ) -> &'a mut LoopbackConversation {
        conversations
            .entry(counterparty.clone())
            .or_insert_with(|| LoopbackConversation {
                history: Vec::new(),
                sender: broadcast::channel(LOOPBACK_CHANNEL_CAPACITY).0,
            })
    }
}

#[async_trait]
impl MessagingTransport for LoopbackTransport {
    #[instrument(skip(self), fields(local = %self.local))]
    async fn connect(&self, counterparty: &Address) -> Result<ConversationHandle, TransportError> {
        if counterparty.is_empty() {
            return Err(TransportError::ConnectFailed {
                reason: "counterparty address is empty".to_string(),
            });
        }
        Self::entry(&mut self.lock(), counterparty);
        debug!("loopback conversation opened");
        Ok(ConversationHandle::new(counterparty.clone()))
    }

    async fn history(&self, handle: &ConversationHandle) -> Result<Vec<Message>, TransportError> {
        Ok(self
            .lock()
            .get(&handle.counterparty)
            .map(|c| c.history.clone())
            .unwrap_or_default())
    }

    async fn subscribe(&self, handle: &ConversationHandle) -> Result<MessageStream, TransportError> {
        let receiver = self
            .lock()
            .get(&handle.counterparty)
            .map(|c| c.sender.subscribe())
            .ok_or_else(|| TransportError::SubscribeFailed {
                reason: format!("no open conversation with {}", handle.counterparty),
            })?;

        let stream = BroadcastStream::new(receiver).map(|item| {
            item.map_err(|BroadcastStreamRecvError::Lagged(skipped)| TransportError::Lagged {
                skipped,
            })
        });
        Ok(stream.boxed())
    }

    async fn send(
        &self,
        handle: &ConversationHandle,
        content: &str,
    ) -> Result<Message, TransportError> {
        if !self.lock().contains_key(&handle.counterparty) {
            return Err(TransportError::SendFailed {
                reason: format!("no open conversation with {}", handle.counterparty),
            });
        }
        let message = Message::new(self.local.clone(), content);
        self.deliver(&handle.counterparty, message.clone());
        Ok(message)
    }
}
