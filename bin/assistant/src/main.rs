//! Terminal chat front-end for the wallet assistant.

mod chat;
mod config;
mod error;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use rootcause::prelude::{Report, ResultExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_assistant_conversation::{LoopbackTransport, NatsConfig, NatsTransport};

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never interleave with the chat on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(2);
        }
    };
    tracing::info!(data_dir = %config.data_dir.display(), "Loaded configuration");

    if let Err(report) = run(config).await {
        tracing::error!("{report}");
        std::process::exit(1);
    }
}

async fn run(config: AssistantConfig) -> Result<(), Report<AssistantError>> {
    match config.nats_url.clone() {
        Some(url) => {
            tracing::info!(%url, "connecting to NATS");
            let transport = NatsTransport::new(NatsConfig::new(url), config.user_address.clone())
                .await
                .context(AssistantError::Transport)?;
            chat::run(&config, transport).await
        }
        None => {
            tracing::info!("no NATS url configured, using loopback transport");
            let transport = LoopbackTransport::new(config.user_address.clone());
            chat::run(&config, transport).await
        }
    }
}
