//! Turn and timeout evaluation.
//!
//! The turn state is never stored. It is re-derived from the session's
//! populated move fields, its last action timestamp and the caller's clock,
//! so callers may poll it as often as they like.

use super::calls::ContractCall;
use super::session::GameSession;
use super::types::Player;
use serde::{Deserialize, Serialize};

/// Inactivity window, in seconds, after which the idle party forfeits.
pub const TIMEOUT_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurnState {
    AwaitingSecondMove,
    AwaitingReveal,
    /// The party that did *not* have to act may take the pot.
    TimedOutClaimable { claimant: Player },
    Resolved,
}

impl TurnState {
    pub fn claimable_by(&self) -> Option<Player> {
        match self {
            TurnState::TimedOutClaimable { claimant } => Some(*claimant),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Resolved)
    }
}

/// Evaluate a session at wall-clock `now` (unix seconds).
///
/// The boundary is inclusive: exactly [`TIMEOUT_SECS`] after the last action
/// the game is already claimable. A clock behind `last_action` counts as no
/// time elapsed.
pub fn evaluate(session: &GameSession, now: u64) -> TurnState {
    if session.is_resolved() {
        return TurnState::Resolved;
    }

    let expired = now.saturating_sub(session.last_action()) >= TIMEOUT_SECS;
    match (session.has_second_moved(), expired) {
        (false, false) => TurnState::AwaitingSecondMove,
        (false, true) => TurnState::TimedOutClaimable {
            claimant: Player::A,
        },
        (true, false) => TurnState::AwaitingReveal,
        (true, true) => TurnState::TimedOutClaimable {
            claimant: Player::B,
        },
    }
}

/// The contract function a claimant calls.
///
/// Named after the party that timed out: the first party claims through
/// `j2Timeout`, the second through `j1Timeout`.
pub fn timeout_call(claimant: Player) -> ContractCall {
    match claimant {
        Player::A => ContractCall::J2Timeout,
        Player::B => ContractCall::J1Timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{commit, Salt};
    use crate::games::Move;
    use alloy_primitives::{Address, U256};

    const T: u64 = 1_700_000_000;

    fn fresh() -> GameSession {
        let c = commit(Move::Rock, &Salt::from(12345u64)).unwrap();
        GameSession::create(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            U256::from(10u64),
            c,
            T,
        )
        .unwrap()
    }

    #[test]
    fn test_awaiting_second_move_until_deadline() {
        let session = fresh();
        assert_eq!(evaluate(&session, T), TurnState::AwaitingSecondMove);
        assert_eq!(evaluate(&session, T + 299), TurnState::AwaitingSecondMove);
        assert_eq!(
            evaluate(&session, T + 300),
            TurnState::TimedOutClaimable {
                claimant: Player::A
            }
        );
    }

    #[test]
    fn test_awaiting_reveal_until_deadline() {
        let mut session = fresh();
        session.submit_second_move(Move::Scissors, T + 50).unwrap();
        assert_eq!(evaluate(&session, T + 349), TurnState::AwaitingReveal);
        assert_eq!(
            evaluate(&session, T + 350),
            TurnState::TimedOutClaimable {
                claimant: Player::B
            }
        );
    }

    #[test]
    fn test_clock_behind_last_action() {
        let session = fresh();
        assert_eq!(evaluate(&session, T - 1_000), TurnState::AwaitingSecondMove);
    }

    #[test]
    fn test_resolved_is_terminal() {
        let mut session = fresh();
        session.submit_second_move(Move::Paper, T).unwrap();
        session
            .reveal_first_move(Move::Rock, &Salt::from(12345u64))
            .unwrap();
        assert_eq!(evaluate(&session, T + 10_000), TurnState::Resolved);
        assert!(evaluate(&session, T).is_terminal());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let session = fresh();
        let first = evaluate(&session, T + 300);
        for _ in 0..10 {
            assert_eq!(evaluate(&session, T + 300), first);
        }
        assert_eq!(first.claimable_by(), Some(Player::A));
    }

    #[test]
    fn test_timeout_call_mapping() {
        assert_eq!(timeout_call(Player::A), ContractCall::J2Timeout);
        assert_eq!(timeout_call(Player::B), ContractCall::J1Timeout);
    }

    #[test]
    fn test_turn_state_serialization() {
        let json = serde_json::to_value(TurnState::TimedOutClaimable {
            claimant: Player::B,
        })
        .unwrap();
        assert_eq!(json["state"], "timed_out_claimable");
        assert_eq!(json["claimant"], "B");
    }
}
