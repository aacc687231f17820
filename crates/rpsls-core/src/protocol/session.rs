//! Client-side mirror of a deployed game.

use super::timeout::{evaluate, TurnState, TIMEOUT_SECS};
use super::types::{decimal, GameResult, Player};
use crate::crypto::{commit, Commitment, Salt};
use crate::error::GameError;
use crate::games::{resolve, Move};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Raw public state of a game contract, as read from the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub contract: Address,
    /// `j1`
    pub first_party: Address,
    /// `j2`
    pub second_party: Address,
    /// `c1Hash`
    pub commitment: Commitment,
    /// `c2`
    pub second_move: Move,
    #[serde(with = "decimal")]
    pub stake: U256,
    /// `lastAction`, unix seconds
    pub last_action: u64,
}

/// The first party's hidden move.
///
/// Held only by the client that deployed the game and never sent anywhere
/// before `solve`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReveal {
    #[serde(rename = "move")]
    pub mv: Move,
    pub salt: Salt,
}

impl PendingReveal {
    pub fn commitment(&self) -> Result<Commitment, GameError> {
        commit(self.mv, &self.salt)
    }
}

/// One game between two fixed participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    contract: Option<Address>,
    first_party: Address,
    second_party: Address,
    #[serde(with = "decimal")]
    stake: U256,
    commitment: Commitment,
    second_move: Move,
    last_action: u64,
    resolved: bool,
    result: Option<GameResult>,
}

impl GameSession {
    /// Record a new game before it is deployed.
    pub fn create(
        first_party: Address,
        second_party: Address,
        stake: U256,
        commitment: Commitment,
        now: u64,
    ) -> Result<Self, GameError> {
        if second_party == Address::ZERO {
            return Err(GameError::InvalidAddress(
                "second party cannot be the zero address".to_string(),
            ));
        }
        if second_party == first_party {
            return Err(GameError::InvalidAddress(
                "second party must differ from the first party".to_string(),
            ));
        }
        if stake.is_zero() {
            return Err(GameError::InvalidStake("stake must be positive".to_string()));
        }

        Ok(Self {
            contract: None,
            first_party,
            second_party,
            stake,
            commitment,
            second_move: Move::Null,
            last_action: now,
            resolved: false,
            result: None,
        })
    }

    /// Bind the session to the address the deployment produced
    pub fn with_contract(mut self, contract: Address) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Mirror the on-chain state. A zero stake means the pot was paid out.
    pub fn from_chain(snapshot: &ChainSnapshot) -> Self {
        Self {
            contract: Some(snapshot.contract),
            first_party: snapshot.first_party,
            second_party: snapshot.second_party,
            stake: snapshot.stake,
            commitment: snapshot.commitment,
            second_move: snapshot.second_move,
            last_action: snapshot.last_action,
            resolved: snapshot.stake.is_zero(),
            result: None,
        }
    }

    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    pub fn first_party(&self) -> Address {
        self.first_party
    }

    pub fn second_party(&self) -> Address {
        self.second_party
    }

    pub fn stake(&self) -> U256 {
        self.stake
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    pub fn second_move(&self) -> Move {
        self.second_move
    }

    pub fn last_action(&self) -> u64 {
        self.last_action
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Outcome, when this client saw the reveal itself
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn has_second_moved(&self) -> bool {
        !self.second_move.is_null()
    }

    pub fn role_of(&self, address: Address) -> Option<Player> {
        if address == self.first_party {
            Some(Player::A)
        } else if address == self.second_party {
            Some(Player::B)
        } else {
            None
        }
    }

    pub fn require_role(&self, address: Address) -> Result<Player, GameError> {
        self.role_of(address).ok_or(GameError::NotAParticipant(address))
    }

    /// Who the game is waiting on, if anyone
    pub fn next_to_act(&self) -> Option<Player> {
        if self.resolved {
            None
        } else if self.has_second_moved() {
            Some(Player::A)
        } else {
            Some(Player::B)
        }
    }

    /// Moment from which the idle party can be timed out
    pub fn deadline(&self) -> u64 {
        self.last_action.saturating_add(TIMEOUT_SECS)
    }

    pub fn seconds_remaining(&self, now: u64) -> u64 {
        self.deadline().saturating_sub(now)
    }

    pub fn turn_state(&self, now: u64) -> TurnState {
        evaluate(self, now)
    }

    /// Second party plays in the clear.
    ///
    /// On chain `lastAction` moves to the block time of `play`; `now` stands
    /// in for it here.
    pub fn submit_second_move(&mut self, mv: Move, now: u64) -> Result<(), GameError> {
        if self.resolved {
            return Err(GameError::AlreadyResolved);
        }
        if mv.is_null() {
            return Err(GameError::InvalidMove("second move cannot be Null".to_string()));
        }
        if self.has_second_moved() {
            return Err(GameError::AlreadyMoved);
        }

        self.second_move = mv;
        self.last_action = now;
        Ok(())
    }

    /// Check a reveal locally and compute the outcome it will produce.
    ///
    /// Run before submitting `solve` so a mismatching reveal never costs a
    /// reverted transaction.
    pub fn reveal_first_move(&mut self, mv: Move, salt: &Salt) -> Result<GameResult, GameError> {
        if self.resolved {
            return Err(GameError::AlreadyResolved);
        }
        if !self.has_second_moved() {
            return Err(GameError::NotYetPlayed);
        }
        if commit(mv, salt)? != self.commitment {
            return Err(GameError::CommitmentMismatch);
        }

        let result = resolve(mv, self.second_move)?;
        self.resolved = true;
        self.result = Some(result);
        Ok(result)
    }

    /// Claim the pot for `claimant` because the other party went idle.
    pub fn claim_timeout(&mut self, claimant: Player, now: u64) -> Result<Player, GameError> {
        match evaluate(self, now) {
            TurnState::Resolved => Err(GameError::AlreadyResolved),
            TurnState::TimedOutClaimable { claimant: entitled } if entitled == claimant => {
                self.resolved = true;
                Ok(claimant)
            }
            TurnState::TimedOutClaimable { .. } => Err(GameError::NotEntitled(claimant)),
            TurnState::AwaitingSecondMove | TurnState::AwaitingReveal => {
                if self.next_to_act() == Some(claimant) {
                    Err(GameError::NotEntitled(claimant))
                } else {
                    Err(GameError::TimeoutNotReached {
                        remaining_secs: self.seconds_remaining(now),
                    })
                }
            }
        }
    }
}
