//! Core domain types and utilities for the wallet assistant.
//!
//! This crate provides the identifiers and wallet addresses shared by the
//! conversation session, its transports, and the CLI.

pub mod address;
pub mod id;

pub use address::Address;
pub use id::{ConversationId, MessageId, ParseIdError};
