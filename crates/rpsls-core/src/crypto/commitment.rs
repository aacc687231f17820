//! Commitment and Salt for the commit-reveal scheme.

use crate::error::GameError;
use crate::games::Move;
use alloy_primitives::U256;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Keccak-256 as used by the EVM.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Salt blinding the first party's move.
///
/// Exactly 256 bits wide, matching the `uint256` the contract accepts in
/// `solve`. Wider or negative inputs are rejected when parsing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt(U256);

impl Salt {
    /// Create a new random, non-zero salt
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let value = U256::from_be_bytes(bytes);
            if !value.is_zero() {
                return Self(value);
            }
        }
    }

    /// Create from raw big-endian bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(bytes))
    }

    /// Big-endian encoding, as hashed into the commitment
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// Zero is a valid hash input but is never used as a default.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Decimal representation, the form shown to the user for safekeeping
    pub fn to_decimal(&self) -> String {
        self.0.to_string()
    }
}

impl From<U256> for Salt {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for Salt {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Salt {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Salt {
    type Err = GameError;

    /// Accepts decimal or `0x`-prefixed hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GameError::InvalidSalt("empty salt".to_string()));
        }
        if s.starts_with('-') {
            return Err(GameError::InvalidSalt("salt must not be negative".to_string()));
        }
        U256::from_str(s)
            .map(Self)
            .map_err(|e| GameError::InvalidSalt(format!("{s}: {e} (max 256 bits)")))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt(<redacted>)")
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_decimal().serialize(s)
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Commitment = keccak256(uint8 move || uint256 salt)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Packed encoding hashed by both this client and the contract.
    fn preimage(mv: Move, salt: &Salt) -> [u8; 33] {
        let mut buf = [0u8; 33];
        buf[0] = mv.code();
        buf[1..].copy_from_slice(&salt.to_bytes());
        buf
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify that the given move and salt produce this commitment
    pub fn verify(&self, mv: Move, salt: &Salt) -> bool {
        matches!(commit(mv, salt), Ok(c) if c == *self)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

/// Compute the commitment for a move and salt.
///
/// Fails for `Move::Null`; the salt width is already enforced by [`Salt`].
pub fn commit(mv: Move, salt: &Salt) -> Result<Commitment, GameError> {
    if mv.is_null() {
        return Err(GameError::InvalidMove("cannot commit to Null".to_string()));
    }
    Ok(Commitment(keccak256(&Commitment::preimage(mv, salt))))
}

impl FromStr for Commitment {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_hex().serialize(s)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
