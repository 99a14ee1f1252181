//! Wallet command parsing for the wallet assistant.
//!
//! This crate provides:
//!
//! - **Commands**: The typed wallet actions a chat line can express
//! - **Parser**: Ordered grammar matching from free text to a command

pub mod command;
pub mod parser;

pub use command::{HELP_TEXT, Network, ParsedCommand, PaymentRequest, Transfer};
pub use parser::parse;
