//! Session configuration.

use crate::classifier::ClassifierMode;
use serde::Deserialize;
use std::time::Duration;
use wallet_assistant_core::Address;

/// Chain reported by the strict classifier's `chain` reply (Sepolia).
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Storage key of the transcript when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "wallet-assistant-messages";

/// Address the simulated assistant replies from when none is configured.
pub const DEFAULT_AGENT_ADDRESS: &str = "0x00000000000000000000000000000000000a6e47";

/// Configuration of one conversation session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Delay before a synthetic reply is appended, in milliseconds.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Key the transcript is persisted under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Address synthetic replies are authored by.
    #[serde(default = "default_agent_address")]
    pub agent_address: Address,

    /// Classifier used to pick replies.
    #[serde(default)]
    pub classifier: ClassifierMode,

    /// Keep at most this many messages; unbounded when unset.
    #[serde(default)]
    pub max_messages: Option<usize>,

    /// Chain id quoted by `chain` replies.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_reply_delay_ms() -> u64 {
    500
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_agent_address() -> Address {
    Address::new(DEFAULT_AGENT_ADDRESS)
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
            storage_key: default_storage_key(),
            agent_address: default_agent_address(),
            classifier: ClassifierMode::default(),
            max_messages: None,
            chain_id: default_chain_id(),
        }
    }
}

impl SessionConfig {
    /// Returns the reply delay as a duration.
    #[must_use]
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}
