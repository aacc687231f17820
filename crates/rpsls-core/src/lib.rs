//! RPSLS Game Core Library
//!
//! This crate provides the protocol logic for the commit-reveal
//! Rock-Paper-Scissors-Spock-Lizard wager played against an on-chain
//! contract: commitments, the session mirror, the turn/timeout evaluator
//! and the outcome resolver. It performs no I/O.

pub mod crypto;
pub mod error;
pub mod games;
pub mod protocol;

pub use alloy_primitives::{Address, U256};
pub use crypto::{commit, Commitment, Salt};
pub use error::GameError;
pub use games::{resolve, Move};
pub use protocol::{
    evaluate, ChainSnapshot, ContractCall, DeployArgs, GameResult, GameSession, PendingReveal,
    Player, ReadField, TurnState, TIMEOUT_SECS,
};
