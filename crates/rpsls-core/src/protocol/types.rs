//! Protocol types.

use crate::error::GameError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game result, from the first party's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    AWins,
    BWins,
    Draw,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::AWins => "A wins",
            GameResult::BWins => "B wins",
            GameResult::Draw => "Draw",
        }
    }

    /// The same result seen with the parties swapped
    pub fn swapped(&self) -> GameResult {
        match self {
            GameResult::AWins => GameResult::BWins,
            GameResult::BWins => GameResult::AWins,
            GameResult::Draw => GameResult::Draw,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            GameResult::AWins => Some(Player::A),
            GameResult::BWins => Some(Player::B),
            GameResult::Draw => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Participant role.
///
/// `A` deployed the contract and committed (`j1`), `B` was named at
/// deployment and plays in the clear (`j2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    /// Get the opponent
    pub fn opponent(&self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "A"),
            Player::B => write!(f, "B"),
        }
    }
}

/// Parse a `0x`-prefixed 20-byte address.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lower or
/// all-upper input is accepted as is.
pub fn parse_address(s: &str) -> Result<Address, GameError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| GameError::InvalidAddress(format!("{s}: missing 0x prefix")))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GameError::InvalidAddress(format!(
            "{s}: expected 40 hex digits"
        )));
    }

    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let parsed = if has_upper && has_lower {
        Address::parse_checksummed(s, None).map_err(|e| e.to_string())
    } else {
        Address::from_str(s).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| GameError::InvalidAddress(format!("{s}: {e}")))
}

/// Parse a stake given in ether (e.g. `"0.01"`) into wei.
pub fn parse_stake_ether(s: &str) -> Result<U256, GameError> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(GameError::InvalidStake(format!("{s}: must be positive")));
    }
    let wei = alloy_primitives::utils::parse_ether(s)
        .map_err(|e| GameError::InvalidStake(format!("{s}: {e}")))?;
    if wei.is_zero() {
        return Err(GameError::InvalidStake(format!("{s}: must be positive")));
    }
    Ok(wei)
}

/// Serde helper writing `U256` amounts as decimal strings.
pub mod decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
        value.to_string().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(d)?;
        U256::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::A.opponent(), Player::B);
        assert_eq!(Player::B.opponent(), Player::A);
    }

    #[test]
    fn test_game_result_str() {
        assert_eq!(GameResult::AWins.as_str(), "A wins");
        assert_eq!(GameResult::BWins.as_str(), "B wins");
        assert_eq!(GameResult::Draw.as_str(), "Draw");
    }

    #[test]
    fn test_game_result_winner() {
        assert_eq!(GameResult::AWins.winner(), Some(Player::A));
        assert_eq!(GameResult::BWins.winner(), Some(Player::B));
        assert_eq!(GameResult::Draw.winner(), None);
    }

    #[test]
    fn test_parse_lowercase_address() {
        let addr = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            addr.to_checksum(None),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_parse_checksummed_address() {
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
        // one character's case flipped
        assert!(matches!(
            parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"),
            Err(GameError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_malformed_address() {
        for bad in [
            "",
            "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea",
            "0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        ] {
            assert!(
                matches!(parse_address(bad), Err(GameError::InvalidAddress(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_stake_ether() {
        assert_eq!(
            parse_stake_ether("0.01").unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert!(matches!(
            parse_stake_ether("0"),
            Err(GameError::InvalidStake(_))
        ));
        assert!(matches!(
            parse_stake_ether("-1"),
            Err(GameError::InvalidStake(_))
        ));
        assert!(matches!(
            parse_stake_ether("lots"),
            Err(GameError::InvalidStake(_))
        ));
    }
}
