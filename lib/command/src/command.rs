//! Typed wallet commands produced by the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrasings the parser understands, shown in reply to `help`.
pub const HELP_TEXT: &str = "\
Available commands:
  balance                                   show your wallet balance
  chain | chain id                          show the connected chain
  send <amount> <token> [network] to <who>  send tokens (also: transfer, pay)
  request <amount> <token> [network] from <who>
                                            request a payment
Networks: mainnet, sepolia";

/// Network qualifier accepted after the currency token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    Mainnet,
    /// Sepolia test network.
    Sepolia,
}

impl Network {
    /// Parses a network token case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("mainnet") {
            Some(Self::Mainnet)
        } else if token.eq_ignore_ascii_case("sepolia") {
            Some(Self::Sepolia)
        } else {
            None
        }
    }

    /// Returns true for test networks.
    #[must_use]
    pub fn is_testnet(self) -> bool {
        matches!(self, Self::Sepolia)
    }
}

/// Payload of an outgoing transfer (`send`, `transfer`, `pay`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Amount of `currency` to move.
    pub amount: f64,
    /// Lowercased currency symbol.
    pub currency: String,
    /// Whether the transfer targets a test network.
    pub testnet: bool,
    /// Free-text recipient: address, phone number or handle.
    pub recipient: String,
}

/// Payload of a payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount of `currency` requested.
    pub amount: f64,
    /// Lowercased currency symbol.
    pub currency: String,
    /// Whether the request targets a test network.
    pub testnet: bool,
    /// Free-text party the payment is requested from.
    pub sender: String,
}

/// A structured wallet action recognized in chat input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParsedCommand {
    /// List available commands.
    Help,
    /// Show the wallet balance.
    Balance,
    /// Show the connected chain.
    Chain,
    /// `send <amount> <currency> to <recipient>`.
    Send(Transfer),
    /// `transfer <amount> <currency> to <recipient>`.
    Transfer(Transfer),
    /// `pay <amount> <currency> to <recipient>`.
    Pay(Transfer),
    /// `request <amount> <currency> from <sender>`.
    Request(PaymentRequest),
}

impl ParsedCommand {
    /// Returns the command discriminator, matching the serialized `type`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Balance => "balance",
            Self::Chain => "chain",
            Self::Send(_) => "send",
            Self::Transfer(_) => "transfer",
            Self::Pay(_) => "pay",
            Self::Request(_) => "request",
        }
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help | Self::Balance | Self::Chain => f.write_str(self.kind()),
            Self::Send(t) | Self::Transfer(t) | Self::Pay(t) => {
                write!(f, "{} {} {}", self.kind(), t.amount, t.currency)?;
                if t.testnet {
                    f.write_str(" on sepolia")?;
                }
                write!(f, " to {}", t.recipient)
            }
            Self::Request(r) => {
                write!(f, "request {} {}", r.amount, r.currency)?;
                if r.testnet {
                    f.write_str(" on sepolia")?;
                }
                write!(f, " from {}", r.sender)
            }
        }
    }
}
