//! Service configuration, read from the environment at start-up.

use alloy_primitives::Address;
use rpsls_chain::contract::DEFAULT_CHAIN_ID;
use rpsls_core::protocol::parse_address;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub port: u16,
    /// JSON-RPC endpoint; the in-memory mock chain is used when unset
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    /// Account to act as; required together with `rpc_url`
    pub player_address: Option<Address>,
    /// How often watched games are re-evaluated for timeouts
    pub timeout_poll: Duration,
    /// Creation bytecode of the game contract
    pub bytecode: Option<Vec<u8>>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            rpc_url: None,
            chain_id: DEFAULT_CHAIN_ID,
            player_address: None,
            timeout_poll: Duration::from_secs(10),
            bytecode: None,
        }
    }
}

impl PlayerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Malformed values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = parsed(&lookup, "PORT", |v| v.parse::<u16>().ok()) {
            config.port = port;
        }
        config.rpc_url = lookup("RPC_URL").filter(|v| !v.trim().is_empty());
        if let Some(chain_id) = parsed(&lookup, "CHAIN_ID", |v| v.parse::<u64>().ok()) {
            config.chain_id = chain_id;
        }
        config.player_address = parsed(&lookup, "PLAYER_ADDRESS", |v| parse_address(v).ok());
        if let Some(secs) = parsed(&lookup, "TIMEOUT_POLL_SECS", |v| {
            v.parse::<u64>().ok().filter(|s| *s > 0)
        }) {
            config.timeout_poll = Duration::from_secs(secs);
        }
        config.bytecode = parsed(&lookup, "RPS_BYTECODE", |v| {
            hex::decode(v.trim().trim_start_matches("0x")).ok()
        });

        config
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let value = parse(&raw);
    if value.is_none() {
        warn!(key, value = %raw, "ignoring malformed setting");
    }
    value
}
