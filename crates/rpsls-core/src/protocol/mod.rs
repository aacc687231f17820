//! Protocol model: session mirror, turn evaluation and contract calls.

mod calls;
mod session;
mod timeout;
mod types;

pub use calls::{selector, ContractCall, DeployArgs, ReadField};
pub use session::{ChainSnapshot, GameSession, PendingReveal};
pub use timeout::{evaluate, timeout_call, TurnState, TIMEOUT_SECS};
pub use types::{decimal, parse_address, parse_stake_ether, GameResult, Player};
