//! Mock chain for testing.
//!
//! Emulates the game contract in memory, including balances and a settable
//! block clock, and reverts wherever the contract's `require`s would.

use super::traits::{ChainError, ChainValue, ContractClient, Receipt, TxHash};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rpsls_core::crypto::keccak256;
use rpsls_core::{commit, Commitment, ContractCall, DeployArgs, Move, ReadField, TIMEOUT_SECS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage of one deployed game
#[derive(Clone, Debug)]
struct MockGame {
    j1: Address,
    j2: Address,
    c1_hash: Commitment,
    c2: Move,
    stake: U256,
    last_action: u64,
}

impl MockGame {
    fn timed_out(&self, now: u64) -> bool {
        now.saturating_sub(self.last_action) >= TIMEOUT_SECS
    }
}

#[derive(Default)]
struct MockChain {
    now: u64,
    nonce: u64,
    games: HashMap<Address, MockGame>,
    balances: HashMap<Address, U256>,
    receipts: HashMap<TxHash, Receipt>,
}

impl MockChain {
    fn next_tx_hash(&mut self) -> TxHash {
        self.nonce += 1;
        TxHash::from_bytes(keccak256(&self.nonce.to_be_bytes()))
    }

    fn debit(&mut self, who: Address, amount: U256) -> Result<(), ChainError> {
        let balance = self.balances.entry(who).or_default();
        if *balance < amount {
            return Err(ChainError::Rejected("insufficient funds".to_string()));
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&mut self, who: Address, amount: U256) {
        *self.balances.entry(who).or_default() += amount;
    }

    fn mined(&mut self, contract_address: Option<Address>) -> TxHash {
        let tx_hash = self.next_tx_hash();
        self.receipts.insert(
            tx_hash,
            Receipt {
                tx_hash,
                success: true,
                contract_address,
            },
        );
        tx_hash
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Reverted(reason.to_string())
}

/// In-memory mock of the game contract
#[derive(Clone)]
pub struct MockContractClient {
    inner: Arc<Mutex<MockChain>>,
}

impl MockContractClient {
    /// Create a mock chain whose clock starts at the current wall-clock time
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::at_time(now)
    }

    /// Create a mock chain with its clock at `now`
    pub fn at_time(now: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockChain {
                now,
                ..MockChain::default()
            })),
        }
    }

    fn chain(&self) -> MutexGuard<'_, MockChain> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current block timestamp
    pub fn now(&self) -> u64 {
        self.chain().now
    }

    pub fn set_time(&self, now: u64) {
        self.chain().now = now;
    }

    /// Advance the block clock by the given number of seconds
    pub fn advance_time(&self, seconds: u64) {
        let mut chain = self.chain();
        chain.now = chain.now.saturating_add(seconds);
    }

    /// Credit an account, e.g. to seed test players
    pub fn fund(&self, who: Address, amount: U256) {
        self.chain().credit(who, amount);
    }

    pub fn balance(&self, who: Address) -> U256 {
        self.chain().balances.get(&who).copied().unwrap_or_default()
    }

    /// Number of deployed games
    pub fn game_count(&self) -> usize {
        self.chain().games.len()
    }
}

impl Default for MockContractClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractClient for MockContractClient {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn read(&self, contract: Address, field: ReadField) -> Result<ChainValue, ChainError> {
        let chain = self.chain();
        let game = chain
            .games
            .get(&contract)
            .ok_or(ChainError::ContractNotFound(contract))?;

        Ok(match field {
            ReadField::J1 => ChainValue::Address(game.j1),
            ReadField::J2 => ChainValue::Address(game.j2),
            ReadField::C1Hash => ChainValue::Bytes32(*game.c1_hash.as_bytes()),
            ReadField::C2 => ChainValue::Uint(U256::from(game.c2.code())),
            ReadField::Stake => ChainValue::Uint(game.stake),
            ReadField::LastAction => ChainValue::Uint(U256::from(game.last_action)),
        })
    }

    async fn write(
        &self,
        from: Address,
        contract: Address,
        call: &ContractCall,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        let mut chain = self.chain();
        let now = chain.now;
        let mut game = chain
            .games
            .get(&contract)
            .cloned()
            .ok_or(ChainError::ContractNotFound(contract))?;

        if game.stake.is_zero() {
            return Err(revert("game already settled"));
        }
        if !matches!(call, ContractCall::Play(_)) && !value.is_zero() {
            return Err(revert("function is not payable"));
        }

        match call {
            ContractCall::Play(mv) => {
                if !game.c2.is_null() {
                    return Err(revert("j2 already played"));
                }
                if mv.is_null() {
                    return Err(revert("null move"));
                }
                if value != game.stake {
                    return Err(revert("stake mismatch"));
                }
                if from != game.j2 {
                    return Err(revert("only j2 can play"));
                }
                chain.debit(from, value)?;
                game.c2 = *mv;
                game.last_action = now;
            }
            ContractCall::Solve(mv, salt) => {
                if mv.is_null() {
                    return Err(revert("null move"));
                }
                if game.c2.is_null() {
                    return Err(revert("j2 has not played"));
                }
                if from != game.j1 {
                    return Err(revert("only j1 can solve"));
                }
                if commit(*mv, salt).ok() != Some(game.c1_hash) {
                    return Err(revert("commitment mismatch"));
                }
                let pot = game.stake * U256::from(2u8);
                if mv.beats(game.c2) {
                    chain.credit(game.j1, pot);
                } else if game.c2.beats(*mv) {
                    chain.credit(game.j2, pot);
                } else {
                    chain.credit(game.j1, game.stake);
                    chain.credit(game.j2, game.stake);
                }
                game.stake = U256::ZERO;
            }
            ContractCall::J1Timeout => {
                if game.c2.is_null() {
                    return Err(revert("j2 has not played"));
                }
                if !game.timed_out(now) {
                    return Err(revert("timeout not reached"));
                }
                chain.credit(game.j2, game.stake * U256::from(2u8));
                game.stake = U256::ZERO;
            }
            ContractCall::J2Timeout => {
                if !game.c2.is_null() {
                    return Err(revert("j2 already played"));
                }
                if !game.timed_out(now) {
                    return Err(revert("timeout not reached"));
                }
                chain.credit(game.j1, game.stake);
                game.stake = U256::ZERO;
            }
        }

        chain.games.insert(contract, game);
        Ok(chain.mined(None))
    }

    async fn deploy(&self, from: Address, args: &DeployArgs) -> Result<TxHash, ChainError> {
        let mut chain = self.chain();
        chain.debit(from, args.stake)?;

        let mut seed = from.to_vec();
        seed.extend_from_slice(&chain.nonce.to_be_bytes());
        let contract = Address::from_slice(&keccak256(&seed)[12..]);

        let game = MockGame {
            j1: from,
            j2: args.second_party,
            c1_hash: args.commitment,
            c2: Move::Null,
            stake: args.stake,
            last_action: chain.now,
        };
        chain.games.insert(contract, game);
        Ok(chain.mined(Some(contract)))
    }

    async fn wait_for_receipt(&self, tx: &TxHash) -> Result<Receipt, ChainError> {
        self.chain()
            .receipts
            .get(tx)
            .cloned()
            .ok_or(ChainError::UnknownTransaction(*tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpsls_core::Salt;

    const T0: u64 = 1_700_000_000;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn stake() -> U256 {
        U256::from(1000u64)
    }

    async fn deployed(client: &MockContractClient, mv: Move, salt: &Salt) -> Address {
        client.fund(alice(), U256::from(10_000u64));
        client.fund(bob(), U256::from(10_000u64));
        let args = DeployArgs {
            commitment: commit(mv, salt).unwrap(),
            second_party: bob(),
            stake: stake(),
        };
        let tx = client.deploy(alice(), &args).await.unwrap();
        let receipt = client.wait_for_receipt(&tx).await.unwrap();
        assert!(receipt.success);
        receipt.contract_address.unwrap()
    }

    #[tokio::test]
    async fn test_deploy_and_snapshot() {
        let client = MockContractClient::at_time(T0);
        let salt = Salt::from(12345u64);
        let contract = deployed(&client, Move::Rock, &salt).await;

        assert_eq!(client.balance(alice()), U256::from(9_000u64));
        let snapshot = client.snapshot(contract).await.unwrap();
        assert_eq!(snapshot.first_party, alice());
        assert_eq!(snapshot.second_party, bob());
        assert_eq!(snapshot.commitment, commit(Move::Rock, &salt).unwrap());
        assert_eq!(snapshot.second_move, Move::Null);
        assert_eq!(snapshot.stake, stake());
        assert_eq!(snapshot.last_action, T0);
    }

    #[tokio::test]
    async fn test_play_and_reveal_pays_winner() {
        let client = MockContractClient::at_time(T0);
        let salt = Salt::from(12345u64);
        let contract = deployed(&client, Move::Rock, &salt).await;

        client.advance_time(30);
        client
            .write(bob(), contract, &ContractCall::Play(Move::Scissors), stake())
            .await
            .unwrap();
        let snapshot = client.snapshot(contract).await.unwrap();
        assert_eq!(snapshot.second_move, Move::Scissors);
        assert_eq!(snapshot.last_action, T0 + 30);

        client
            .write(
                alice(),
                contract,
                &ContractCall::Solve(Move::Rock, salt),
                U256::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(client.balance(alice()), U256::from(11_000u64));
        assert_eq!(client.balance(bob()), U256::from(9_000u64));
        assert!(client.snapshot(contract).await.unwrap().stake.is_zero());
    }

    #[tokio::test]
    async fn test_draw_refunds_both() {
        let client = MockContractClient::at_time(T0);
        let salt = Salt::from(1u64);
        let contract = deployed(&client, Move::Spock, &salt).await;

        client
            .write(bob(), contract, &ContractCall::Play(Move::Spock), stake())
            .await
            .unwrap();
        client
            .write(alice(), contract, &ContractCall::Solve(Move::Spock, salt), U256::ZERO)
            .await
            .unwrap();

        assert_eq!(client.balance(alice()), U256::from(10_000u64));
        assert_eq!(client.balance(bob()), U256::from(10_000u64));
    }

    #[tokio::test]
    async fn test_play_reverts() {
        let client = MockContractClient::at_time(T0);
        let contract = deployed(&client, Move::Rock, &Salt::from(5u64)).await;

        let wrong_stake = client
            .write(bob(), contract, &ContractCall::Play(Move::Paper), U256::from(1u64))
            .await;
        assert!(matches!(wrong_stake, Err(ChainError::Reverted(_))));

        let wrong_sender = client
            .write(alice(), contract, &ContractCall::Play(Move::Paper), stake())
            .await;
        assert!(matches!(wrong_sender, Err(ChainError::Reverted(_))));

        client
            .write(bob(), contract, &ContractCall::Play(Move::Paper), stake())
            .await
            .unwrap();
        let again = client
            .write(bob(), contract, &ContractCall::Play(Move::Rock), stake())
            .await;
        assert!(matches!(again, Err(ChainError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_solve_with_wrong_salt_reverts() {
        let client = MockContractClient::at_time(T0);
        let contract = deployed(&client, Move::Rock, &Salt::from(5u64)).await;
        client
            .write(bob(), contract, &ContractCall::Play(Move::Paper), stake())
            .await
            .unwrap();

        let result = client
            .write(
                alice(),
                contract,
                &ContractCall::Solve(Move::Rock, Salt::from(6u64)),
                U256::ZERO,
            )
            .await;
        assert!(matches!(result, Err(ChainError::Reverted(_))));
        assert_eq!(client.snapshot(contract).await.unwrap().stake, stake());
    }

    #[tokio::test]
    async fn test_j2_timeout_refunds_first_party() {
        let client = MockContractClient::at_time(T0);
        let contract = deployed(&client, Move::Rock, &Salt::from(5u64)).await;

        client.advance_time(TIMEOUT_SECS - 1);
        let early = client
            .write(alice(), contract, &ContractCall::J2Timeout, U256::ZERO)
            .await;
        assert!(matches!(early, Err(ChainError::Reverted(_))));

        client.advance_time(1);
        client
            .write(alice(), contract, &ContractCall::J2Timeout, U256::ZERO)
            .await
            .unwrap();
        assert_eq!(client.balance(alice()), U256::from(10_000u64));
    }

    #[tokio::test]
    async fn test_j1_timeout_pays_second_party() {
        let client = MockContractClient::at_time(T0);
        let contract = deployed(&client, Move::Rock, &Salt::from(5u64)).await;
        client
            .write(bob(), contract, &ContractCall::Play(Move::Paper), stake())
            .await
            .unwrap();

        client.advance_time(TIMEOUT_SECS + 1);
        client
            .write(bob(), contract, &ContractCall::J1Timeout, U256::ZERO)
            .await
            .unwrap();
        assert_eq!(client.balance(bob()), U256::from(11_000u64));

        let settled = client
            .write(bob(), contract, &ContractCall::J1Timeout, U256::ZERO)
            .await;
        assert!(matches!(settled, Err(ChainError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let client = MockContractClient::at_time(T0);
        let args = DeployArgs {
            commitment: commit(Move::Rock, &Salt::from(1u64)).unwrap(),
            second_party: bob(),
            stake: stake(),
        };
        let result = client.deploy(alice(), &args).await;
        assert!(matches!(result, Err(ChainError::Rejected(_))));
        assert_eq!(client.game_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_contract() {
        let client = MockContractClient::at_time(T0);
        let missing = Address::repeat_byte(0x99);
        assert!(matches!(
            client.read(missing, ReadField::J1).await,
            Err(ChainError::ContractNotFound(_))
        ));
    }
}
