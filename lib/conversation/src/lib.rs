//! Conversation service for the wallet assistant.
//!
//! This crate provides:
//!
//! - **Session**: Transcript lifecycle, inbound listening and simulated replies
//! - **Classifier**: Keyword and grammar based intent detection
//! - **Transcript Store**: Durable persistence of the transcript
//! - **Transport**: Messaging transports (loopback and NATS)

pub mod classifier;
pub mod config;
pub mod error;
pub mod message;
pub mod nats;
pub mod reply;
pub mod session;
pub mod store;
pub mod transcript;
pub mod transport;

pub use classifier::{ClassifierMode, Intent, classify};
pub use config::SessionConfig;
pub use error::{SessionError, StoreError, TransportError};
pub use message::Message;
pub use nats::{NatsConfig, NatsTransport};
pub use reply::{BalanceLookup, FixedBalance, RandomBalance, ReplyComposer};
pub use session::{ConversationSession, SessionState};
pub use store::{FileTranscriptStore, MemoryTranscriptStore, TranscriptStore};
pub use transcript::Transcript;
pub use transport::{ConversationHandle, LoopbackTransport, MessageStream, MessagingTransport};
