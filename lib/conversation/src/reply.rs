//! Synthetic assistant replies.

use crate::classifier::Intent;
use rand::Rng;
use std::sync::Arc;
use wallet_assistant_command::{HELP_TEXT, ParsedCommand};
use wallet_assistant_core::Address;

/// Reply when no intent was recognized.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that. Try \"balance\" or \"send\".";

/// Reply to a loosely classified send.
pub const SEND_SUBMITTED_REPLY: &str = "Transaction submitted successfully!";

/// Source of the balance figure quoted in replies.
pub trait BalanceLookup: Send + Sync {
    /// Returns the ETH balance to report for `address`.
    fn balance_eth(&self, address: &Address) -> f64;
}

/// Stand-in lookup returning a random figure between 0 and 10 ETH.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBalance;

impl BalanceLookup for RandomBalance {
    fn balance_eth(&self, _address: &Address) -> f64 {
        rand::thread_rng().gen_range(0.0..10.0)
    }
}

/// Lookup that always reports the same figure.
#[derive(Debug, Clone, Copy)]
pub struct FixedBalance(pub f64);

impl BalanceLookup for FixedBalance {
    fn balance_eth(&self, _address: &Address) -> f64 {
        self.0
    }
}

/// Turns a classified intent into reply text.
#[derive(Clone)]
pub struct ReplyComposer {
    balance: Arc<dyn BalanceLookup>,
    chain_id: u64,
}

impl ReplyComposer {
    /// Creates a composer quoting balances from `balance`.
    #[must_use]
    pub fn new(balance: Arc<dyn BalanceLookup>, chain_id: u64) -> Self {
        Self { balance, chain_id }
    }

    /// Composes the reply to `intent`, asked by `asker`.
    #[must_use]
    pub fn compose(&self, intent: &Intent, asker: &Address) -> String {
        match intent {
            Intent::Balance | Intent::Command(ParsedCommand::Balance) => self.balance_reply(asker),
            Intent::Send => SEND_SUBMITTED_REPLY.to_string(),
            Intent::Command(ParsedCommand::Help) => HELP_TEXT.to_string(),
            Intent::Command(ParsedCommand::Chain) => {
                format!("Connected to chain id {}", self.chain_id)
            }
            Intent::Command(
                cmd @ (ParsedCommand::Send(_) | ParsedCommand::Transfer(_) | ParsedCommand::Pay(_)),
            ) => format!("Transaction submitted: {cmd}"),
            Intent::Command(cmd @ ParsedCommand::Request(_)) => {
                format!("Payment request created: {cmd}")
            }
            Intent::Unrecognized => FALLBACK_REPLY.to_string(),
        }
    }

    fn balance_reply(&self, asker: &Address) -> String {
        format!("Your balance is {:.4} ETH", self.balance.balance_eth(asker))
    }
}
