//! Typed descriptions of the contract's ABI surface.

use crate::crypto::{keccak256, Commitment, Salt};
use crate::games::Move;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// 4-byte function selector
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn word_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// State-changing calls on a deployed game
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    /// Second party's move, sent with a stake equal to the first party's
    Play(Move),
    /// First party's reveal
    Solve(Move, Salt),
    /// Second party claims after the first party failed to reveal
    J1Timeout,
    /// First party reclaims after the second party failed to play
    J2Timeout,
}

impl ContractCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::Play(_) => "play",
            ContractCall::Solve(..) => "solve",
            ContractCall::J1Timeout => "j1Timeout",
            ContractCall::J2Timeout => "j2Timeout",
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            ContractCall::Play(_) => "play(uint8)",
            ContractCall::Solve(..) => "solve(uint8,uint256)",
            ContractCall::J1Timeout => "j1Timeout()",
            ContractCall::J2Timeout => "j2Timeout()",
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(self.signature())
    }

    /// ABI-encoded calldata
    pub fn calldata(&self) -> Vec<u8> {
        let mut data = self.selector().to_vec();
        match self {
            ContractCall::Play(mv) => {
                data.extend_from_slice(&word_u256(U256::from(mv.code())));
            }
            ContractCall::Solve(mv, salt) => {
                data.extend_from_slice(&word_u256(U256::from(mv.code())));
                data.extend_from_slice(&salt.to_bytes());
            }
            ContractCall::J1Timeout | ContractCall::J2Timeout => {}
        }
        data
    }
}

/// Public getters read to mirror a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadField {
    J1,
    J2,
    C1Hash,
    C2,
    Stake,
    LastAction,
}

impl ReadField {
    pub const ALL: [ReadField; 6] = [
        ReadField::J1,
        ReadField::J2,
        ReadField::C1Hash,
        ReadField::C2,
        ReadField::Stake,
        ReadField::LastAction,
    ];

    pub fn function_name(&self) -> &'static str {
        match self {
            ReadField::J1 => "j1",
            ReadField::J2 => "j2",
            ReadField::C1Hash => "c1Hash",
            ReadField::C2 => "c2",
            ReadField::Stake => "stake",
            ReadField::LastAction => "lastAction",
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&format!("{}()", self.function_name()))
    }
}

/// Constructor arguments for a new game, sent with `stake` attached
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployArgs {
    pub commitment: Commitment,
    pub second_party: Address,
    pub stake: U256,
}

impl DeployArgs {
    /// `abi.encode(bytes32 c1Hash, address j2)`
    pub fn constructor_args(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(self.commitment.as_bytes());
        data.extend_from_slice(&word_address(self.second_party));
        data
    }

    /// Creation bytecode followed by the encoded constructor arguments
    pub fn creation_code(&self, bytecode: &[u8]) -> Vec<u8> {
        let mut data = bytecode.to_vec();
        data.extend_from_slice(&self.constructor_args());
        data
    }
}
