//! Terminal chat loop.
//!
//! Reads lines from stdin and sends them through the session. A printer
//! task renders every transcript entry once, as it appears. Ctrl-C, end of
//! input, or `/quit` ends the chat.

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use rootcause::prelude::{Report, ResultExt};
use std::collections::HashSet;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info};
use wallet_assistant_conversation::{
    ConversationSession, FileTranscriptStore, Message, MessagingTransport,
};
use wallet_assistant_core::Address;

/// Runs an interactive chat over `transport` until the user quits.
///
/// # Errors
///
/// Returns an error if the session cannot connect or stdin fails.
pub async fn run<T: MessagingTransport>(
    config: &AssistantConfig,
    transport: T,
) -> Result<(), Report<AssistantError>> {
    let store = FileTranscriptStore::new(&config.data_dir);
    let mut session = ConversationSession::open(config.session.clone(), store, transport).await;

    let counterparty = config.counterparty();
    session
        .connect(counterparty.clone())
        .await
        .context(AssistantError::Session)?;
    info!(%counterparty, "chatting; type \"help\", \"balance\" or \"send ...\", /quit to exit");

    let printer = tokio::spawn(print_transcript(
        session.watch(),
        config.user_address.clone(),
    ));

    let result = read_input(&session).await;

    session.shutdown().await;
    printer.abort();
    result
}

async fn read_input<T: MessagingTransport>(
    session: &ConversationSession<FileTranscriptStore, T>,
) -> Result<(), Report<AssistantError>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            line = lines.next_line() => line.context(AssistantError::Input)?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            return Ok(());
        }
        if let Err(report) = session.send(line).await {
            error!("{report}");
        }
    }
}

async fn print_transcript(mut messages: watch::Receiver<Vec<Message>>, user: Address) {
    let mut printed = HashSet::new();
    loop {
        let fresh: Vec<Message> = messages
            .borrow_and_update()
            .iter()
            .filter(|m| printed.insert(m.id))
            .cloned()
            .collect();
        for message in &fresh {
            println!("{}", render(message, &user));
        }
        if messages.changed().await.is_err() {
            return;
        }
    }
}

fn render(message: &Message, user: &Address) -> String {
    let who = if message.is_from(user) {
        "you".to_string()
    } else if message.is_simulated {
        "assistant".to_string()
    } else {
        message.sender_address.to_string()
    };
    format!(
        "[{}] {who}: {}",
        message.sent_at.format("%H:%M:%S"),
        message.content
    )
}
