//! Cryptographic primitives for the RPSLS game.
//!
//! The commitment published at deployment is `keccak256(uint8 move ||
//! uint256 salt)`, the same packed encoding the contract recomputes in
//! `solve`.

mod commitment;

pub use commitment::{commit, keccak256, Commitment, Salt};
