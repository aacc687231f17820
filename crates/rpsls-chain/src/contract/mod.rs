//! Game contract client abstraction.

mod mock;
mod rpc;
mod traits;

pub use mock::MockContractClient;
pub use rpc::{RpcContractClient, DEFAULT_CHAIN_ID};
pub use traits::{ChainError, ChainValue, ContractClient, Receipt, TxHash};
