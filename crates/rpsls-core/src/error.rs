//! Errors raised by the game model before anything reaches the chain.

use thiserror::Error;

/// Validation and consistency failures.
///
/// All of these are detected locally; none of them should ever result in a
/// submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid stake: {0}")]
    InvalidStake(String),

    #[error("Second party has already moved")]
    AlreadyMoved,

    #[error("Second party has not moved yet")]
    NotYetPlayed,

    #[error("Move and salt do not match the stored commitment")]
    CommitmentMismatch,

    #[error("Game already resolved")]
    AlreadyResolved,

    #[error("Timeout not reached: {remaining_secs}s remaining")]
    TimeoutNotReached { remaining_secs: u64 },

    #[error("Player {0} is not entitled to claim the timeout")]
    NotEntitled(crate::protocol::Player),

    #[error("Address {0} is not a participant of this game")]
    NotAParticipant(alloy_primitives::Address),
}
