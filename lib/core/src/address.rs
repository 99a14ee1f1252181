//! Wallet addresses and chat handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address identifying a chat participant.
///
/// Usually a hex wallet address, but any handle works. Addresses are
/// trimmed and ASCII-lowercased on construction so `0xABC` and `0xabc`
/// name the same participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Creates a normalized address.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    /// Returns the normalized address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the address is empty after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Address::new("  0xABcD "), Address::new("0xabcd"));
        assert_eq!(Address::new("0xABcD").as_str(), "0xabcd");
    }

    #[test]
    fn deserializing_normalizes() {
        let address: Address = serde_json::from_str("\"0xDEAD\"").expect("deserialize");
        assert_eq!(address.as_str(), "0xdead");
        assert_eq!(serde_json::to_string(&address).expect("serialize"), "\"0xdead\"");
    }

    #[test]
    fn blank_address_is_empty() {
        assert!(Address::new("   ").is_empty());
    }
}
