//! Conversation session with simulated assistant replies.
//!
//! A session owns the transcript of one conversation. It restores the
//! transcript from its store on open, connects to a counterparty through a
//! messaging transport, replays history, then consumes inbound messages one
//! at a time. Every newly recorded message from the user is classified and
//! answered once, after a fixed delay, by a simulated reply authored by the
//! agent address. History is recorded without replies, but a message that
//! shows up in both the history and the live stream was sent while
//! connecting and is answered when its live copy arrives.
//!
//! The listen loop and all pending replies run as tracked tasks bound to a
//! cancellation token. [`ConversationSession::shutdown`] cancels them and
//! waits; dropping the session cancels them without waiting.

use crate::classifier::{Intent, classify};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::message::Message;
use crate::reply::{BalanceLookup, RandomBalance, ReplyComposer};
use crate::store::TranscriptStore;
use crate::transcript::Transcript;
use crate::transport::{ConversationHandle, MessageStream, MessagingTransport};
use futures::StreamExt;
use rootcause::prelude::{Report, ResultExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};
use wallet_assistant_core::{Address, MessageId};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transcript restored, no conversation open.
    Idle,
    /// Opening the conversation and fetching history.
    Connecting,
    /// Consuming inbound messages.
    Listening,
    /// Shut down, or the inbound stream ended.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Closed => "closed",
        })
    }
}

/// State shared between the session handle and its background tasks.
struct Shared<S> {
    config: SessionConfig,
    store: S,
    composer: ReplyComposer,
    transcript: Mutex<Transcript>,
    /// Messages first recorded from history and not yet seen live.
    replayed: Mutex<HashSet<MessageId>>,
    messages: watch::Sender<Vec<Message>>,
    state: watch::Sender<SessionState>,
    pending_replies: AtomicUsize,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl<S: TranscriptStore + 'static> Shared<S> {
    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "session state changed");
        }
    }

    /// Records an inbound message and schedules its reply.
    async fn receive(self: &Arc<Self>, message: Message) {
        let answerable =
            !message.is_simulated && !message.is_from(&self.config.agent_address);
        let intent = classify(self.config.classifier, &message.content);
        let asker = message.sender_address.clone();
        let id = message.id;

        let first_live = self.record(message).await || self.replayed.lock().await.remove(&id);
        if !first_live {
            debug!(%id, "ignoring duplicate message");
            return;
        }
        if answerable {
            self.schedule_reply(intent, asker);
        }
    }

    fn schedule_reply(self: &Arc<Self>, intent: Intent, asker: Address) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.pending_replies.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(self);
        self.tasks.spawn(async move {
            tokio::select! {
                () = shared.cancel.cancelled() => debug!("pending reply cancelled"),
                () = tokio::time::sleep(shared.config.reply_delay()) => {
                    let text = shared.composer.compose(&intent, &asker);
                    let reply = Message::simulated(shared.config.agent_address.clone(), text);
                    shared.record(reply).await;
                }
            }
            shared.pending_replies.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Appends a message, persists, and notifies observers.
    ///
    /// Returns false if the message was already recorded.
    async fn record(&self, message: Message) -> bool {
        let mut transcript = self.transcript.lock().await;
        if !transcript.append(message) {
            return false;
        }

        self.persist(&transcript).await;
        self.messages.send_replace(transcript.messages().to_vec());
        true
    }

    /// Writes the full transcript. Failures are logged and otherwise ignored.
    async fn persist(&self, transcript: &Transcript) {
        if transcript.is_empty() {
            return;
        }
        let bytes = match serde_json::to_vec(transcript.messages()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to serialize transcript");
                return;
            }
        };
        if let Err(e) = self.store.save(&self.config.storage_key, &bytes).await {
            warn!(error = %e, "failed to persist transcript");
        }
    }
}

/// Restores a transcript, discarding records that fail to deserialize.
async fn load_transcript<S: TranscriptStore>(store: &S, config: &SessionConfig) -> Transcript {
    let key = config.storage_key.as_str();
    let empty = || Transcript::bounded(config.max_messages);
    let bytes = match store.load(key).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return empty(),
        Err(e) => {
            warn!(error = %e, "failed to read stored transcript, starting empty");
            return empty();
        }
    };

    match serde_json::from_slice::<Vec<Message>>(&bytes) {
        Ok(messages) => {
            let transcript = Transcript::from_messages(messages, config.max_messages);
            debug!(count = transcript.len(), "restored transcript");
            transcript
        }
        Err(e) => {
            warn!(error = %e, key, "discarding corrupt stored transcript");
            if let Err(e) = store.remove(key).await {
                warn!(error = %e, "failed to remove corrupt transcript");
            }
            empty()
        }
    }
}

async fn listen<S: TranscriptStore + 'static>(shared: Arc<Shared<S>>, mut stream: MessageStream) {
    loop {
        tokio::select! {
            () = shared.cancel.cancelled() => {
                debug!("listen loop cancelled");
                return;
            }
            next = stream.next() => match next {
                Some(Ok(message)) => shared.receive(message).await,
                Some(Err(e)) => warn!(error = %e, "skipping inbound message"),
                None => {
                    info!("inbound stream ended");
                    shared.set_state(SessionState::Closed);
                    return;
                }
            },
        }
    }
}

/// A conversation between the local user and one counterparty.
pub struct ConversationSession<S, T> {
    shared: Arc<Shared<S>>,
    transport: T,
    handle: Option<ConversationHandle>,
}

impl<S, T> ConversationSession<S, T>
where
    S: TranscriptStore + 'static,
    T: MessagingTransport,
{
    /// Opens a session, restoring any transcript persisted under the
    /// configured key. Balance replies quote a random figure.
    pub async fn open(config: SessionConfig, store: S, transport: T) -> Self {
        Self::with_balance(config, store, transport, Arc::new(RandomBalance)).await
    }

    /// Opens a session whose balance replies quote `balance`.
    pub async fn with_balance(
        config: SessionConfig,
        store: S,
        transport: T,
        balance: Arc<dyn BalanceLookup>,
    ) -> Self {
        let transcript = load_transcript(&store, &config).await;
        let composer = ReplyComposer::new(balance, config.chain_id);

        let shared = Shared {
            messages: watch::Sender::new(transcript.messages().to_vec()),
            state: watch::Sender::new(SessionState::Idle),
            transcript: Mutex::new(transcript),
            replayed: Mutex::new(HashSet::new()),
            pending_replies: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
            config,
            store,
            composer,
        };

        Self {
            shared: Arc::new(shared),
            transport,
            handle: None,
        }
    }

    /// Connects to `counterparty`, replays its history, and starts
    /// listening for inbound messages.
    ///
    /// History is recorded without replies. A session connects at most
    /// once; on failure it returns to `Idle` and may be retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the session already left `Idle`, or if the
    /// transport fails to connect, subscribe or fetch history.
    #[instrument(skip(self, counterparty), fields(counterparty = %counterparty))]
    pub async fn connect(&mut self, counterparty: Address) -> Result<(), Report<SessionError>> {
        let state = self.state();
        if state != SessionState::Idle {
            return Err(SessionError::AlreadyConnected {
                state: state.to_string(),
            }
            .into());
        }

        self.shared.set_state(SessionState::Connecting);
        let (handle, stream, history) = match self.open_conversation(&counterparty).await {
            Ok(opened) => opened,
            Err(e) => {
                self.shared.set_state(SessionState::Idle);
                return Err(e);
            }
        };

        let mut replayed = HashSet::new();
        for message in history {
            let id = message.id;
            if self.shared.record(message).await {
                replayed.insert(id);
            }
        }
        let replayed_count = replayed.len();
        *self.shared.replayed.lock().await = replayed;

        self.shared
            .tasks
            .spawn(listen(Arc::clone(&self.shared), stream));
        self.handle = Some(handle);
        self.shared.set_state(SessionState::Listening);

        info!(replayed = replayed_count, "session listening");
        Ok(())
    }

    /// Subscribes before fetching history so nothing sent in between is
    /// missed. Messages in both are recorded once and answered once.
    async fn open_conversation(
        &self,
        counterparty: &Address,
    ) -> Result<(ConversationHandle, MessageStream, Vec<Message>), Report<SessionError>> {
        let context = || SessionError::Connect {
            counterparty: counterparty.clone(),
        };

        let handle = self
            .transport
            .connect(counterparty)
            .await
            .context(context())?;
        let stream = self.transport.subscribe(&handle).await.context(context())?;
        let history = self.transport.history(&handle).await.context(context())?;

        Ok((handle, stream, history))
    }

    /// Sends `content` to the counterparty.
    ///
    /// The transport echoes the message back on the inbound stream, where
    /// it is recorded and answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not connected or the transport
    /// fails to deliver.
    pub async fn send(&self, content: &str) -> Result<Message, Report<SessionError>> {
        let handle = self.handle.as_ref().ok_or(SessionError::NotConnected)?;
        let message = self
            .transport
            .send(handle, content)
            .await
            .context(SessionError::SendFailed)?;
        debug!(id = %message.id, "message sent");
        Ok(message)
    }

    /// Feeds a message into the session as if it arrived from the transport.
    pub async fn ingest(&self, message: Message) {
        self.shared.receive(message).await;
    }

    /// Cancels the listen loop and pending replies, then waits for them.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();
        self.shared.tasks.close();
        self.shared.tasks.wait().await;
        self.shared.set_state(SessionState::Closed);
        info!("session shut down");
    }

    /// Returns a snapshot of the transcript.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.shared.messages.borrow().clone()
    }

    /// Returns a receiver notified with the full transcript on every change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Vec<Message>> {
        self.shared.messages.subscribe()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Returns a receiver notified on every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Returns the number of replies scheduled but not yet delivered.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.shared.pending_replies.load(Ordering::SeqCst)
    }

    /// Returns the counterparty once connected.
    #[must_use]
    pub fn counterparty(&self) -> Option<&Address> {
        self.handle.as_ref().map(|h| &h.counterparty)
    }
}

impl<S, T> Drop for ConversationSession<S, T> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierMode;
    use crate::error::StoreError;
    use crate::reply::{FALLBACK_REPLY, FixedBalance, SEND_SUBMITTED_REPLY};
    use crate::store::MemoryTranscriptStore;
    use crate::transport::LoopbackTransport;
    use async_trait::async_trait;
    use std::time::Duration;

    fn user() -> Address {
        Address::new("0xuser")
    }

    fn agent() -> Address {
        Address::new("0xagent")
    }

    fn config() -> SessionConfig {
        SessionConfig {
            agent_address: agent(),
            ..SessionConfig::default()
        }
    }

    async fn session_with(
        config: SessionConfig,
        store: MemoryTranscriptStore,
        transport: LoopbackTransport,
    ) -> ConversationSession<MemoryTranscriptStore, LoopbackTransport> {
        ConversationSession::with_balance(config, store, transport, Arc::new(FixedBalance(1.25)))
            .await
    }

    async fn connected(
        store: MemoryTranscriptStore,
        transport: LoopbackTransport,
    ) -> ConversationSession<MemoryTranscriptStore, LoopbackTransport> {
        let mut session = session_with(config(), store, transport).await;
        session.connect(agent()).await.unwrap();
        session
    }

    async fn wait_for_len(
        session: &ConversationSession<MemoryTranscriptStore, LoopbackTransport>,
        len: usize,
    ) -> Vec<Message> {
        let mut rx = session.watch();
        let messages = rx.wait_for(|m| m.len() == len).await.unwrap().clone();
        messages
    }

    #[tokio::test(start_paused = true)]
    async fn balance_question_gets_one_balance_reply() {
        let session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;

        session.send("Hi, what's my balance?").await.unwrap();
        let messages = wait_for_len(&session, 2).await;

        assert_eq!(messages[0].content, "Hi, what's my balance?");
        assert!(messages[0].is_from(&user()));
        assert!(messages[1].is_simulated);
        assert!(messages[1].is_from(&agent()));
        assert_eq!(messages[1].content, "Your balance is 1.2500 ETH");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn send_prefix_gets_submitted_reply() {
        let session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;

        session.send("send 5 to bob").await.unwrap();
        let messages = wait_for_len(&session, 2).await;
        assert_eq!(messages[1].content, SEND_SUBMITTED_REPLY);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_text_gets_fallback_reply() {
        let session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;

        session.send("gm").await.unwrap();
        let messages = wait_for_len(&session, 2).await;
        assert_eq!(messages[1].content, FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_waits_for_the_configured_delay() {
        let session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;

        session.send("balance").await.unwrap();
        wait_for_len(&session, 1).await;
        assert_eq!(session.pending_replies(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(session.messages().len(), 1);

        wait_for_len(&session, 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn agent_and_simulated_messages_get_no_reply() {
        let transport = LoopbackTransport::new(user());
        let session = connected(MemoryTranscriptStore::new(), transport.clone()).await;

        transport.deliver(&agent(), Message::new(agent(), "welcome"));
        session
            .ingest(Message::simulated(Address::new("0xother"), "balance"))
            .await;

        wait_for_len(&session, 2).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn history_is_replayed_once_without_replies() {
        let store = MemoryTranscriptStore::new();
        let transport = LoopbackTransport::new(user());
        transport.deliver(&agent(), Message::new(user(), "old question"));
        transport.deliver(&agent(), Message::new(agent(), "old answer"));

        let session = connected(store.clone(), transport.clone()).await;
        assert_eq!(session.messages().len(), 2);
        session.shutdown().await;
        drop(session);

        let session = connected(store, transport).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let contents: Vec<_> = session.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["old question", "old answer"]);
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_round_trips_through_the_store() {
        let store = MemoryTranscriptStore::new();
        let session = connected(store.clone(), LoopbackTransport::new(user())).await;

        session.send("balance").await.unwrap();
        let messages = wait_for_len(&session, 2).await;
        session.shutdown().await;

        let stored: Vec<Message> =
            serde_json::from_slice(&store.get(&config().storage_key).unwrap()).unwrap();
        assert_eq!(stored, messages);

        let reopened = session_with(config(), store, LoopbackTransport::new(user())).await;
        assert_eq!(reopened.messages(), messages);
        assert_eq!(reopened.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn corrupt_record_is_discarded() {
        let store = MemoryTranscriptStore::new();
        store.insert(config().storage_key, "{not json");

        let session = session_with(config(), store.clone(), LoopbackTransport::new(user())).await;

        assert!(session.messages().is_empty());
        assert_eq!(store.get(&config().storage_key), None);
    }

    #[tokio::test]
    async fn empty_transcript_is_not_persisted() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(config(), store.clone(), LoopbackTransport::new(user())).await;
        session.connect(agent()).await.unwrap();

        assert_eq!(store.get(&config().storage_key), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_replies() {
        let session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;

        session.send("balance").await.unwrap();
        wait_for_len(&session, 1).await;
        session.shutdown().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.pending_replies(), 0);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn connect_is_allowed_once() {
        let mut session = connected(MemoryTranscriptStore::new(), LoopbackTransport::new(user())).await;
        assert_eq!(session.state(), SessionState::Listening);
        assert_eq!(session.counterparty(), Some(&agent()));

        let err = session.connect(agent()).await.unwrap_err();
        assert!(err.to_string().contains("listening"));
    }

    #[tokio::test]
    async fn failed_connect_returns_to_idle() {
        let mut session =
            session_with(config(), MemoryTranscriptStore::new(), LoopbackTransport::new(user()))
                .await;

        let err = session.connect(Address::new("")).await.unwrap_err();
        assert!(err.to_string().contains("failed to connect"));
        assert_eq!(session.state(), SessionState::Idle);

        session.connect(agent()).await.unwrap();
        assert_eq!(session.state(), SessionState::Listening);
    }

    #[tokio::test]
    async fn send_requires_connection() {
        let session =
            session_with(config(), MemoryTranscriptStore::new(), LoopbackTransport::new(user()))
                .await;

        let err = session.send("hello").await.unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn stream_end_closes_the_session() {
        let transport = LoopbackTransport::new(user());
        let session = connected(MemoryTranscriptStore::new(), transport.clone()).await;
        let mut state = session.watch_state();

        transport.close(&agent());
        state
            .wait_for(|s| *s == SessionState::Closed)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn strict_classifier_replies_per_command() {
        let config = SessionConfig {
            classifier: ClassifierMode::Strict,
            ..config()
        };
        let mut session =
            session_with(config, MemoryTranscriptStore::new(), LoopbackTransport::new(user()))
                .await;
        session.connect(agent()).await.unwrap();

        session.send("send 10 usdc sepolia to 0xabc").await.unwrap();
        let messages = wait_for_len(&session, 2).await;
        assert_eq!(
            messages[1].content,
            "Transaction submitted: send 10 usdc on sepolia to 0xabc"
        );

        session.send("send 5 to bob").await.unwrap();
        let messages = wait_for_len(&session, 4).await;
        assert_eq!(messages[3].content, FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn retention_keeps_the_newest_messages() {
        let config = SessionConfig {
            max_messages: Some(2),
            ..config()
        };
        let mut session =
            session_with(config, MemoryTranscriptStore::new(), LoopbackTransport::new(user()))
                .await;
        session.connect(agent()).await.unwrap();

        session.send("balance").await.unwrap();
        session.send("send 1 eth to bob").await.unwrap();

        let mut rx = session.watch();
        let messages = rx
            .wait_for(|m| m.len() == 2 && m.iter().all(|m| m.is_simulated))
            .await
            .unwrap()
            .clone();
        assert!(messages.iter().any(|m| m.content == SEND_SUBMITTED_REPLY));
        assert!(messages.iter().any(|m| m.content.starts_with("Your balance is")));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_transcript_survives_reload_and_replay() {
        let config = SessionConfig {
            max_messages: Some(2),
            ..config()
        };
        let store = MemoryTranscriptStore::new();
        let transport = LoopbackTransport::new(user());
        let start = chrono::Utc::now() - chrono::Duration::minutes(1);
        for (i, content) in ["m1", "m2", "m3", "m4"].into_iter().enumerate() {
            let message = Message {
                sent_at: start + chrono::Duration::seconds(i as i64),
                ..Message::new(user(), content)
            };
            transport.deliver(&agent(), message);
        }
        let contents = |session: &ConversationSession<MemoryTranscriptStore, LoopbackTransport>| {
            session.messages().into_iter().map(|m| m.content).collect::<Vec<_>>()
        };

        let mut session = session_with(config.clone(), store.clone(), transport.clone()).await;
        session.connect(agent()).await.unwrap();
        assert_eq!(contents(&session), ["m3", "m4"]);
        session.shutdown().await;
        drop(session);

        let mut session = session_with(config, store, transport).await;
        assert_eq!(contents(&session), ["m3", "m4"]);
        session.connect(agent()).await.unwrap();
        assert_eq!(contents(&session), ["m3", "m4"]);
    }

    /// Transport where `message` lands between subscribing and fetching
    /// history, so it shows up in both.
    struct RacingTransport {
        message: Message,
    }

    #[async_trait]
    impl MessagingTransport for RacingTransport {
        async fn connect(
            &self,
            counterparty: &Address,
        ) -> Result<ConversationHandle, crate::error::TransportError> {
            Ok(ConversationHandle::new(counterparty.clone()))
        }

        async fn history(
            &self,
            _handle: &ConversationHandle,
        ) -> Result<Vec<Message>, crate::error::TransportError> {
            Ok(vec![self.message.clone()])
        }

        async fn subscribe(
            &self,
            _handle: &ConversationHandle,
        ) -> Result<MessageStream, crate::error::TransportError> {
            let live = futures::stream::iter([Ok(self.message.clone())]);
            Ok(live.chain(futures::stream::pending()).boxed())
        }

        async fn send(
            &self,
            _handle: &ConversationHandle,
            content: &str,
        ) -> Result<Message, crate::error::TransportError> {
            Ok(Message::new(user(), content))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn message_sent_while_connecting_is_answered_once() {
        let transport = RacingTransport {
            message: Message::new(user(), "what's my balance"),
        };
        let mut session = ConversationSession::with_balance(
            config(),
            MemoryTranscriptStore::new(),
            transport,
            Arc::new(FixedBalance(2.0)),
        )
        .await;
        session.connect(agent()).await.unwrap();

        let mut rx = session.watch();
        let messages = rx.wait_for(|m| m.len() == 2).await.unwrap().clone();
        assert_eq!(messages[0].content, "what's my balance");
        assert_eq!(messages[1].content, "Your balance is 2.0000 ETH");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.pending_replies(), 0);
    }

    struct FailingStore;

    #[async_trait]
    impl TranscriptStore for FailingStore {
        async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::ReadFailed {
                key: key.to_string(),
                reason: "unavailable".to_string(),
            })
        }

        async fn save(&self, key: &str, _data: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed {
                key: key.to_string(),
                reason: "unavailable".to_string(),
            })
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn store_failures_do_not_interrupt_the_conversation() {
        let mut session = ConversationSession::with_balance(
            config(),
            FailingStore,
            LoopbackTransport::new(user()),
            Arc::new(FixedBalance(3.0)),
        )
        .await;
        session.connect(agent()).await.unwrap();

        session.send("balance").await.unwrap();
        let mut rx = session.watch();
        let messages = rx.wait_for(|m| m.len() == 2).await.unwrap().clone();
        assert_eq!(messages[1].content, "Your balance is 3.0000 ETH");
    }
}
