//! Free-text command parser.
//!
//! Grammars are tried in a fixed order and the first match wins. All
//! matching is case-insensitive and runs on the trimmed input. Word
//! boundaries and digits are ASCII only. Input that fits no grammar yields
//! `None`; callers treat that as "not recognized" and prompt the user, it
//! is not an error.

use crate::command::{Network, ParsedCommand, PaymentRequest, Transfer};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static BALANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)balance(?-u:\b)").expect("balance pattern is valid")
});

static CHAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^chain(?: id)?$").expect("chain pattern is valid"));

static SEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(send|transfer|pay)\s+([0-9]+(?:\.[0-9]+)?)\s*([a-z]+)(?:\s+(mainnet|sepolia))?\s+to\s+(.+)$",
    )
    .expect("send pattern is valid")
});

static REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^request\s+([0-9]+(?:\.[0-9]+)?)\s*([a-z]+)(?:\s+(mainnet|sepolia))?\s+from\s+(.+)$",
    )
    .expect("request pattern is valid")
});

/// Parses a chat line into a wallet command.
///
/// Order: `help`, then a standalone `balance` anywhere in the line, then
/// `chain` / `chain id`, then the send grammar, then the request grammar.
#[must_use]
pub fn parse(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("help") {
        return Some(ParsedCommand::Help);
    }

    if BALANCE.is_match(input) {
        return Some(ParsedCommand::Balance);
    }

    if CHAIN.is_match(input) {
        return Some(ParsedCommand::Chain);
    }

    if let Some(caps) = SEND.captures(input) {
        return parse_send(&caps);
    }

    if let Some(caps) = REQUEST.captures(input) {
        return parse_request(&caps);
    }

    None
}

fn parse_send(caps: &Captures<'_>) -> Option<ParsedCommand> {
    let transfer = Transfer {
        amount: caps[2].parse().ok()?,
        currency: caps[3].to_ascii_lowercase(),
        testnet: is_testnet(caps.get(4).map(|m| m.as_str())),
        recipient: caps[5].trim().to_string(),
    };

    let verb = caps[1].to_ascii_lowercase();
    match verb.as_str() {
        "send" => Some(ParsedCommand::Send(transfer)),
        "transfer" => Some(ParsedCommand::Transfer(transfer)),
        "pay" => Some(ParsedCommand::Pay(transfer)),
        _ => None,
    }
}

fn parse_request(caps: &Captures<'_>) -> Option<ParsedCommand> {
    Some(ParsedCommand::Request(PaymentRequest {
        amount: caps[1].parse().ok()?,
        currency: caps[2].to_ascii_lowercase(),
        testnet: is_testnet(caps.get(3).map(|m| m.as_str())),
        sender: caps[4].trim().to_string(),
    }))
}

fn is_testnet(token: Option<&str>) -> bool {
    token
        .and_then(Network::from_token)
        .is_some_and(Network::is_testnet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: f64, currency: &str, testnet: bool, recipient: &str) -> Transfer {
        Transfer {
            amount,
            currency: currency.to_string(),
            testnet,
            recipient: recipient.to_string(),
        }
    }

    #[test]
    fn help_is_trimmed_and_case_folded() {
        assert_eq!(parse("help"), Some(ParsedCommand::Help));
        assert_eq!(parse("  HELP  "), Some(ParsedCommand::Help));
        assert_eq!(parse("help me"), None);
    }

    #[test]
    fn balance_matches_as_a_standalone_word() {
        assert_eq!(parse("what is my balance please"), Some(ParsedCommand::Balance));
        assert_eq!(parse("BALANCE?"), Some(ParsedCommand::Balance));
        assert_eq!(parse("imbalance"), None);
        assert_eq!(parse("balances"), None);
    }

    #[test]
    fn word_boundaries_and_digits_are_ascii() {
        assert_eq!(parse("ébalance"), Some(ParsedCommand::Balance));
        assert_eq!(parse("balanceé"), Some(ParsedCommand::Balance));
        assert_eq!(parse("send \u{0663} eth to bob"), None);
    }

    #[test]
    fn balance_wins_over_send_grammar() {
        assert_eq!(parse("send 1 eth to balance"), Some(ParsedCommand::Balance));
    }

    #[test]
    fn chain_requires_the_whole_input() {
        assert_eq!(parse("chain"), Some(ParsedCommand::Chain));
        assert_eq!(parse("Chain ID"), Some(ParsedCommand::Chain));
        assert_eq!(parse("  chain id "), Some(ParsedCommand::Chain));
        assert_eq!(parse("what chain"), None);
        assert_eq!(parse("chain ids"), None);
    }

    #[test]
    fn send_with_sepolia_is_testnet() {
        assert_eq!(
            parse("send 10 usdc sepolia to 0xabc"),
            Some(ParsedCommand::Send(transfer(10.0, "usdc", true, "0xabc")))
        );
    }

    #[test]
    fn send_without_network_or_on_mainnet_is_not_testnet() {
        assert_eq!(
            parse("send 2.5 ETH to +1 555 0100"),
            Some(ParsedCommand::Send(transfer(2.5, "eth", false, "+1 555 0100")))
        );
        assert_eq!(
            parse("send 1 eth MAINNET to vitalik.eth"),
            Some(ParsedCommand::Send(transfer(1.0, "eth", false, "vitalik.eth")))
        );
    }

    #[test]
    fn transfer_and_pay_keep_their_verb() {
        assert_eq!(
            parse("Transfer 3 dai to alice"),
            Some(ParsedCommand::Transfer(transfer(3.0, "dai", false, "alice")))
        );
        assert_eq!(
            parse("pay 0.01 eth SePoLiA to bob"),
            Some(ParsedCommand::Pay(transfer(0.01, "eth", true, "bob")))
        );
    }

    #[test]
    fn currency_may_touch_the_amount() {
        assert_eq!(
            parse("send 10usdc to carol"),
            Some(ParsedCommand::Send(transfer(10.0, "usdc", false, "carol")))
        );
    }

    #[test]
    fn recipient_is_the_trimmed_remainder() {
        assert_eq!(
            parse("send 1 eth to   bob to alice  "),
            Some(ParsedCommand::Send(transfer(1.0, "eth", false, "bob to alice")))
        );
    }

    #[test]
    fn invalid_network_token_fails_the_grammar() {
        assert_eq!(parse("send 10 usdc mainnetxyz to 0xabc"), None);
        assert_eq!(parse("send 10 usdc goerli to 0xabc"), None);
    }

    #[test]
    fn malformed_amounts_and_currencies_do_not_match() {
        assert_eq!(parse("send 1.2.3 eth to bob"), None);
        assert_eq!(parse("send .5 eth to bob"), None);
        assert_eq!(parse("send 5 to bob"), None);
        assert_eq!(parse("send 5 usd2 to bob"), None);
        assert_eq!(parse("send 5 eth to"), None);
    }

    #[test]
    fn request_uses_from_and_sender() {
        assert_eq!(
            parse("request 25 USDC sepolia from dave"),
            Some(ParsedCommand::Request(PaymentRequest {
                amount: 25.0,
                currency: "usdc".to_string(),
                testnet: true,
                sender: "dave".to_string(),
            }))
        );
        assert_eq!(parse("request 25 usdc to dave"), None);
        assert_eq!(parse("send 25 usdc from dave"), None);
    }

    #[test]
    fn unrecognized_input_is_no_match() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("swap 1 eth for usdc"), None);
    }
}
