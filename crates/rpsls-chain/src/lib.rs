//! RPSLS Chain Library
//!
//! The external collaborators the game talks to:
//! - `ContractClient` trait with `MockContractClient` and `RpcContractClient`
//! - `Wallet` trait with `LocalWallet`

pub mod contract;
pub mod wallet;

pub use contract::{
    ChainError, ChainValue, ContractClient, MockContractClient, Receipt, RpcContractClient, TxHash,
};
pub use wallet::{LocalWallet, Wallet};
