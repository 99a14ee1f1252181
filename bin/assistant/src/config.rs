//! Centralized assistant configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `WALLET_ASSISTANT_`, using `__` to reach nested sections, e.g.
//! `WALLET_ASSISTANT_SESSION__REPLY_DELAY_MS=250`.

use serde::Deserialize;
use std::path::PathBuf;
use wallet_assistant_conversation::SessionConfig;
use wallet_assistant_core::Address;

/// Address the CLI sends as when none is configured.
const DEFAULT_USER_ADDRESS: &str = "0x000000000000000000000000000000000000beef";

/// CLI configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct AssistantConfig {
    /// Directory holding persisted transcripts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address of the local user.
    #[serde(default = "default_user_address")]
    pub user_address: Address,

    /// Who to chat with. Defaults to the session's agent address.
    #[serde(default)]
    pub counterparty_address: Option<Address>,

    /// NATS server URL. The in-process loopback transport is used when unset.
    #[serde(default)]
    pub nats_url: Option<String>,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".wallet-assistant")
}

fn default_user_address() -> Address {
    Address::new(DEFAULT_USER_ADDRESS)
}

impl AssistantConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let source = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("WALLET_ASSISTANT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(source)
    }

    /// Deserializes an already-built configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has the wrong type.
    pub fn from_config(source: config::Config) -> Result<Self, config::ConfigError> {
        source.try_deserialize()
    }

    /// Returns the address the session connects to.
    #[must_use]
    pub fn counterparty(&self) -> Address {
        self.counterparty_address
            .clone()
            .unwrap_or_else(|| self.session.agent_address.clone())
    }
}
