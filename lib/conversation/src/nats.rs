//! NATS-backed messaging transport.
//!
//! Messages are JSON-encoded [`Message`] values published on one subject
//! per participant pair, `chat.<a>.<b>` with the two addresses sorted so
//! both sides agree on it. A JetStream stream captures those subjects so
//! history survives reconnects; live messages arrive over a core
//! subscription on the same subject.

use crate::error::TransportError;
use crate::message::Message;
use crate::transport::{ConversationHandle, MessageStream, MessagingTransport};
use async_nats::jetstream;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use wallet_assistant_core::Address;

/// Subject prefix for chat messages.
const CHAT_SUBJECT_PREFIX: &str = "chat";

/// Stream name for chat history.
const CHAT_STREAM_NAME: &str = "CHAT_MESSAGES";

/// How long history replay waits for the next stored message.
const HISTORY_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for the NATS transport.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL.
    pub url: String,
    /// Stream name for chat history (defaults to CHAT_MESSAGES).
    pub stream_name: Option<String>,
}

impl NatsConfig {
    /// Creates a new config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_name: None,
        }
    }

    fn stream(&self) -> &str {
        self.stream_name.as_deref().unwrap_or(CHAT_STREAM_NAME)
    }
}

/// Messaging transport over NATS and JetStream.
pub struct NatsTransport {
    client: async_nats::Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
    local: Address,
}

impl NatsTransport {
    /// Connects to NATS and ensures the chat stream exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or stream setup fails.
    pub async fn new(config: NatsConfig, local: Address) -> Result<Self, TransportError> {
        let client = async_nats::connect(&config.url).await.map_err(|e| {
            TransportError::ConnectFailed {
                reason: e.to_string(),
            }
        })?;

        let jetstream = jetstream::new(client.clone());

        let stream_config = jetstream::stream::Config {
            name: config.stream().to_string(),
            subjects: vec![format!("{CHAT_SUBJECT_PREFIX}.>")],
            storage: jetstream::stream::StorageType::File,
            retention: jetstream::stream::RetentionPolicy::Limits,
            ..Default::default()
        };

        jetstream
            .get_or_create_stream(stream_config)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                reason: format!("failed to create chat stream: {e}"),
            })?;

        Ok(Self {
            client,
            jetstream,
            config,
            local,
        })
    }

    /// Returns the subject shared by `a` and `b`.
    fn conversation_subject(a: &Address, b: &Address) -> String {
        let mut pair = [subject_token(a), subject_token(b)];
        pair.sort();
        format!("{CHAT_SUBJECT_PREFIX}.{}.{}", pair[0], pair[1])
    }

    fn subject(&self, handle: &ConversationHandle) -> String {
        Self::conversation_subject(&self.local, &handle.counterparty)
    }
}

/// Maps an address onto a single NATS subject token.
fn subject_token(address: &Address) -> String {
    address
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn decode(payload: &[u8]) -> Result<Message, TransportError> {
    serde_json::from_slice(payload).map_err(|e| TransportError::Decode {
        reason: e.to_string(),
    })
}

#[async_trait]
impl MessagingTransport for NatsTransport {
    #[instrument(skip(self), fields(local = %self.local))]
    async fn connect(&self, counterparty: &Address) -> Result<ConversationHandle, TransportError> {
        if counterparty.is_empty() {
            return Err(TransportError::ConnectFailed {
                reason: "counterparty address is empty".to_string(),
            });
        }
        let handle = ConversationHandle::new(counterparty.clone());
        debug!(subject = %self.subject(&handle), "nats conversation opened");
        Ok(handle)
    }

    #[instrument(skip(self, handle), fields(counterparty = %handle.counterparty))]
    async fn history(&self, handle: &ConversationHandle) -> Result<Vec<Message>, TransportError> {
        let history_failed = |reason: String| TransportError::HistoryFailed { reason };

        let stream = self
            .jetstream
            .get_stream(self.config.stream())
            .await
            .map_err(|e| history_failed(format!("failed to get stream: {e}")))?;

        let consumer = stream
            .create_consumer(jetstream::consumer::pull::Config {
                filter_subject: self.subject(handle),
                deliver_policy: jetstream::consumer::DeliverPolicy::All,
                ..Default::default()
            })
            .await
            .map_err(|e| history_failed(format!("failed to create consumer: {e}")))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| history_failed(format!("failed to get messages: {e}")))?;

        let mut history = Vec::new();
        while let Ok(Some(item)) = tokio::time::timeout(HISTORY_IDLE_TIMEOUT, messages.next()).await
        {
            let item = item.map_err(|e| history_failed(e.to_string()))?;
            match decode(&item.payload) {
                Ok(message) => history.push(message),
                Err(e) => warn!(error = %e, "skipping undecodable history entry"),
            }
            item.ack()
                .await
                .map_err(|e| history_failed(format!("failed to ack message: {e}")))?;
        }

        debug!(count = history.len(), "loaded conversation history");
        Ok(history)
    }

    async fn subscribe(&self, handle: &ConversationHandle) -> Result<MessageStream, TransportError> {
        let subscriber = self
            .client
            .subscribe(self.subject(handle))
            .await
            .map_err(|e| TransportError::SubscribeFailed {
                reason: e.to_string(),
            })?;

        Ok(subscriber.map(|message| decode(&message.payload)).boxed())
    }

    #[instrument(skip(self, handle, content), fields(counterparty = %handle.counterparty))]
    async fn send(
        &self,
        handle: &ConversationHandle,
        content: &str,
    ) -> Result<Message, TransportError> {
        let message = Message::new(self.local.clone(), content);
        let bytes = serde_json::to_vec(&message).map_err(|e| TransportError::SendFailed {
            reason: format!("failed to serialize message: {e}"),
        })?;

        self.jetstream
            .publish(self.subject(handle), bytes.into())
            .await
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })?
            .await
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })?;

        Ok(message)
    }
}
