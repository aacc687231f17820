//! Contract client trait definition.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rpsls_core::{ChainSnapshot, Commitment, ContractCall, DeployArgs, Move, ReadField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from chain operations
#[derive(Debug, Error)]
pub enum ChainError {
    /// The wallet or node refused to sign or send
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Failed to read {field}: {reason}")]
    Read { field: &'static str, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("No game contract at {0}")]
    ContractNotFound(Address),

    #[error("Unknown transaction {0}")]
    UnknownTransaction(TxHash),

    #[error("Deployment bytecode not configured")]
    NoBytecode,
}

impl ChainError {
    fn read(field: ReadField, reason: impl Into<String>) -> Self {
        ChainError::Read {
            field: field.function_name(),
            reason: reason.into(),
        }
    }
}

/// Transaction hash
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_hex().serialize(s)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Value returned by a getter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainValue {
    Address(Address),
    Uint(U256),
    Bytes32([u8; 32]),
}

impl ChainValue {
    pub fn into_address(self, field: ReadField) -> Result<Address, ChainError> {
        match self {
            ChainValue::Address(a) => Ok(a),
            other => Err(ChainError::read(field, format!("expected address, got {other:?}"))),
        }
    }

    pub fn into_uint(self, field: ReadField) -> Result<U256, ChainError> {
        match self {
            ChainValue::Uint(v) => Ok(v),
            other => Err(ChainError::read(field, format!("expected uint, got {other:?}"))),
        }
    }

    pub fn into_bytes32(self, field: ReadField) -> Result<[u8; 32], ChainError> {
        match self {
            ChainValue::Bytes32(b) => Ok(b),
            other => Err(ChainError::read(field, format!("expected bytes32, got {other:?}"))),
        }
    }
}

/// Transaction receipt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub success: bool,
    /// Set for deployments
    pub contract_address: Option<Address>,
}

/// Trait for game contract operations
///
/// Implementations can be:
/// - MockContractClient for testing
/// - RpcContractClient for a real node
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Support downcasting to concrete types
    fn as_any(&self) -> &dyn std::any::Any;

    /// Call one of the public getters
    async fn read(&self, contract: Address, field: ReadField) -> Result<ChainValue, ChainError>;

    /// Send a state-changing call from `from` with `value` wei attached
    async fn write(
        &self,
        from: Address,
        contract: Address,
        call: &ContractCall,
        value: U256,
    ) -> Result<TxHash, ChainError>;

    /// Deploy a new game with the stake attached
    async fn deploy(&self, from: Address, args: &DeployArgs) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined
    async fn wait_for_receipt(&self, tx: &TxHash) -> Result<Receipt, ChainError>;

    /// Read every getter needed to mirror a game
    async fn snapshot(&self, contract: Address) -> Result<ChainSnapshot, ChainError> {
        let first_party = self
            .read(contract, ReadField::J1)
            .await?
            .into_address(ReadField::J1)?;
        let second_party = self
            .read(contract, ReadField::J2)
            .await?
            .into_address(ReadField::J2)?;
        let commitment = self
            .read(contract, ReadField::C1Hash)
            .await?
            .into_bytes32(ReadField::C1Hash)?;
        let c2 = self
            .read(contract, ReadField::C2)
            .await?
            .into_uint(ReadField::C2)?;
        let stake = self
            .read(contract, ReadField::Stake)
            .await?
            .into_uint(ReadField::Stake)?;
        let last_action = self
            .read(contract, ReadField::LastAction)
            .await?
            .into_uint(ReadField::LastAction)?;

        let second_move = u8::try_from(c2)
            .ok()
            .and_then(|code| Move::try_from(code).ok())
            .ok_or_else(|| ChainError::read(ReadField::C2, format!("bad move code {c2}")))?;
        let last_action = u64::try_from(last_action)
            .map_err(|e| ChainError::read(ReadField::LastAction, e.to_string()))?;

        Ok(ChainSnapshot {
            contract,
            first_party,
            second_party,
            commitment: Commitment::from_bytes(commitment),
            second_move,
            stake,
            last_action,
        })
    }
}
