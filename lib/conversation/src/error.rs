//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `TransportError`: Errors from the messaging transport
//! - `StoreError`: Errors from the transcript store
//! - `SessionError`: High-level wrapper for context

use wallet_assistant_core::Address;
use std::fmt;

/// Errors from messaging transport operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open a conversation with the counterparty.
    ConnectFailed { reason: String },
    /// Could not subscribe to inbound messages.
    SubscribeFailed { reason: String },
    /// Could not fetch conversation history.
    HistoryFailed { reason: String },
    /// Could not deliver an outbound message.
    SendFailed { reason: String },
    /// An inbound payload was not a valid message.
    Decode { reason: String },
    /// The subscriber fell behind and missed messages.
    Lagged { skipped: u64 },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { reason } => write!(f, "transport connect failed: {reason}"),
            Self::SubscribeFailed { reason } => {
                write!(f, "transport subscribe failed: {reason}")
            }
            Self::HistoryFailed { reason } => write!(f, "transport history failed: {reason}"),
            Self::SendFailed { reason } => write!(f, "transport send failed: {reason}"),
            Self::Decode { reason } => write!(f, "invalid inbound message: {reason}"),
            Self::Lagged { skipped } => {
                write!(f, "inbound stream lagged, {skipped} messages skipped")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors from transcript store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading a stored record failed.
    ReadFailed { key: String, reason: String },
    /// Writing or removing a record failed.
    WriteFailed { key: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { key, reason } => {
                write!(f, "failed to read transcript '{key}': {reason}")
            }
            Self::WriteFailed { key, reason } => {
                write!(f, "failed to write transcript '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// High-level session errors.
///
/// Use these to add context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Connecting to the counterparty failed (use as context wrapper).
    Connect { counterparty: Address },
    /// The session has no open conversation yet.
    NotConnected,
    /// `connect` was called on a session that already left `Idle`.
    AlreadyConnected { state: String },
    /// Sending an outbound message failed (use as context wrapper).
    SendFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { counterparty } => {
                write!(f, "failed to connect session to {counterparty}")
            }
            Self::NotConnected => write!(f, "session is not connected"),
            Self::AlreadyConnected { state } => {
                write!(f, "session cannot connect from state {state}")
            }
            Self::SendFailed => write!(f, "failed to send message"),
        }
    }
}

impl std::error::Error for SessionError {}
