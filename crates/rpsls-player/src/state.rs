//! Application state management.

use crate::config::PlayerConfig;
use crate::error::AppError;
use crate::pending::PendingWrites;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rpsls_chain::{
    ChainError, ContractClient, LocalWallet, MockContractClient, Receipt, TxHash, Wallet,
};
use rpsls_core::{evaluate, GameResult, GameSession, PendingReveal, Player, TurnState};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Balance credited to a freshly connected account on the mock chain (100 ether)
pub const DEMO_BALANCE_WEI: u128 = 100_000_000_000_000_000_000;

/// A game this service has seen, as of the last refresh
#[derive(Clone, Debug)]
pub struct TrackedGame {
    pub session: GameSession,
    /// The first party's hidden move, present only where the game was created
    pub reveal: Option<PendingReveal>,
    pub turn: TurnState,
    /// Outcome, when this service submitted the reveal
    pub result: Option<GameResult>,
}

/// Shared player state
pub struct PlayerState {
    pub config: PlayerConfig,
    client: Arc<dyn ContractClient>,
    wallet: RwLock<LocalWallet>,
    games: RwLock<HashMap<Address, TrackedGame>>,
    pub pending: PendingWrites,
    /// Simulated current time (for timeout testing)
    current_time: RwLock<Option<DateTime<Utc>>>,
}

impl PlayerState {
    pub fn new(config: PlayerConfig, client: Arc<dyn ContractClient>, wallet: LocalWallet) -> Self {
        Self {
            config,
            client,
            wallet: RwLock::new(wallet),
            games: RwLock::new(HashMap::new()),
            pending: PendingWrites::new(),
            current_time: RwLock::new(None),
        }
    }

    /// The in-memory chain, when running without a node
    pub fn mock(&self) -> Option<&MockContractClient> {
        self.client.as_any().downcast_ref::<MockContractClient>()
    }

    // Clock

    /// Get current time (real or simulated)
    pub fn now(&self) -> DateTime<Utc> {
        self.current_time
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .unwrap_or_else(Utc::now)
    }

    /// Current time as unix seconds, the unit the contract uses
    pub fn now_secs(&self) -> u64 {
        u64::try_from(self.now().timestamp()).unwrap_or_default()
    }

    pub fn set_time(&self, now: DateTime<Utc>) {
        *self.current_time.write().unwrap_or_else(|p| p.into_inner()) = Some(now);
    }

    pub fn set_time_secs(&self, secs: u64) {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        if let Some(now) = Utc.timestamp_opt(secs, 0).single() {
            self.set_time(now);
        }
    }

    /// Advance simulated time by seconds
    pub fn advance_time(&self, seconds: i64) -> Result<DateTime<Utc>, AppError> {
        let out_of_range = || AppError::BadRequest(format!("Cannot advance clock by {seconds}s"));
        let delta = TimeDelta::try_seconds(seconds).ok_or_else(out_of_range)?;

        let mut current = self.current_time.write().unwrap_or_else(|p| p.into_inner());
        let base = current.unwrap_or_else(Utc::now);
        let next = base.checked_add_signed(delta).ok_or_else(out_of_range)?;
        *current = Some(next);
        Ok(next)
    }

    /// Bring the mock chain's block clock up to the local clock before a
    /// write, so both agree on elapsed time.
    fn sync_mock_clock(&self) {
        if let Some(mock) = self.mock() {
            let now = self.now_secs();
            if now > mock.now() {
                mock.set_time(now);
            }
        }
    }

    // Wallet

    pub fn account(&self) -> Option<Address> {
        self.wallet.read().unwrap_or_else(|p| p.into_inner()).account()
    }

    pub fn require_account(&self) -> Result<Address, ChainError> {
        self.wallet
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .require_account()
    }

    /// Connect the wallet, optionally switching to another account first.
    ///
    /// On the mock chain an empty account is seeded with [`DEMO_BALANCE_WEI`].
    pub fn connect(&self, address: Option<Address>) -> Result<Address, ChainError> {
        let account = {
            let mut wallet = self.wallet.write().unwrap_or_else(|p| p.into_inner());
            if let Some(address) = address {
                wallet.select(address);
            }
            wallet.connect()?
        };

        if let Some(mock) = self.mock() {
            if mock.balance(account).is_zero() {
                mock.fund(account, U256::from(DEMO_BALANCE_WEI));
                info!(%account, "funded demo account");
            }
        }
        info!(%account, "wallet connected");
        Ok(account)
    }

    pub fn disconnect(&self) {
        self.wallet
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .disconnect();
        info!("wallet disconnected");
    }

    /// Balance of the account, when the chain exposes one
    pub fn balance(&self, account: Address) -> Option<U256> {
        self.mock().map(|mock| mock.balance(account))
    }

    // Games

    pub fn tracked(&self, contract: Address) -> Option<TrackedGame> {
        self.games
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&contract)
            .cloned()
    }

    /// Every tracked game the account takes part in
    pub fn games_of(&self, account: Address) -> Vec<(Address, TrackedGame)> {
        let games = self.games.read().unwrap_or_else(|p| p.into_inner());
        let mut mine: Vec<_> = games
            .iter()
            .filter(|(_, game)| game.session.role_of(account).is_some())
            .map(|(contract, game)| (*contract, game.clone()))
            .collect();
        mine.sort_by_key(|(_, game)| std::cmp::Reverse(game.session.last_action()));
        mine
    }

    /// Start tracking a game this service just deployed.
    pub fn track_created(&self, contract: Address, session: GameSession, reveal: PendingReveal) {
        let turn = evaluate(&session, self.now_secs());
        self.games.write().unwrap_or_else(|p| p.into_inner()).insert(
            contract,
            TrackedGame {
                session,
                reveal: Some(reveal),
                turn,
                result: None,
            },
        );
    }

    /// Record the outcome of a reveal this service submitted.
    pub fn record_result(&self, contract: Address, result: GameResult) {
        let mut games = self.games.write().unwrap_or_else(|p| p.into_inner());
        if let Some(game) = games.get_mut(&contract) {
            game.result = Some(result);
            game.reveal = None;
        }
    }

    /// Re-read a game from the chain and re-evaluate its turn state.
    ///
    /// Locally held data (the pending reveal and a seen result) survives.
    pub async fn refresh(&self, contract: Address) -> Result<TrackedGame, AppError> {
        let snapshot = self.client.snapshot(contract).await?;
        Ok(self.store(contract, GameSession::from_chain(&snapshot)))
    }

    /// Like [`refresh`](Self::refresh), on behalf of `account`.
    ///
    /// A game `account` does not take part in is never tracked.
    pub async fn refresh_as(
        &self,
        contract: Address,
        account: Address,
    ) -> Result<(Player, TrackedGame), AppError> {
        let snapshot = self.client.snapshot(contract).await?;
        let session = GameSession::from_chain(&snapshot);
        let role = session.require_role(account)?;
        Ok((role, self.store(contract, session)))
    }

    fn store(&self, contract: Address, session: GameSession) -> TrackedGame {
        let turn = evaluate(&session, self.now_secs());

        let mut games = self.games.write().unwrap_or_else(|p| p.into_inner());
        let previous = games.remove(&contract);
        if turn != previous.as_ref().map(|g| g.turn).unwrap_or(turn) {
            match turn {
                TurnState::TimedOutClaimable { claimant } => {
                    info!(%contract, %claimant, "timeout is claimable");
                }
                TurnState::Resolved => info!(%contract, "game resolved"),
                _ => {}
            }
        }

        let (reveal, result) = previous
            .map(|g| (g.reveal, g.result))
            .unwrap_or((None, None));
        let game = TrackedGame {
            session,
            reveal,
            turn,
            result,
        };
        games.insert(contract, game.clone());
        game
    }

    /// Refresh every tracked game that is not yet resolved.
    ///
    /// Read failures are logged and leave the previous view in place.
    pub async fn refresh_watched(&self) -> usize {
        let watched: Vec<Address> = self
            .games
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|(_, game)| !game.turn.is_terminal())
            .map(|(contract, _)| *contract)
            .collect();

        for contract in &watched {
            if let Err(e) = self.refresh(*contract).await {
                warn!(%contract, error = %e, "failed to refresh game");
            }
        }
        watched.len()
    }

    // Transactions

    /// Deploy a game and wait for its address.
    pub async fn deploy(
        &self,
        from: Address,
        args: &rpsls_core::DeployArgs,
    ) -> Result<(TxHash, Address), AppError> {
        self.sync_mock_clock();
        let tx = self.client.deploy(from, args).await?;
        let receipt = self.confirm(&tx).await?;
        let contract = receipt.contract_address.ok_or_else(|| {
            ChainError::Network(format!("Deployment {tx} produced no contract address"))
        })?;
        Ok((tx, contract))
    }

    /// Send a call and wait for it to be mined.
    pub async fn send(
        &self,
        from: Address,
        contract: Address,
        call: &rpsls_core::ContractCall,
        value: U256,
    ) -> Result<TxHash, AppError> {
        self.sync_mock_clock();
        let tx = self.client.write(from, contract, call, value).await?;
        self.confirm(&tx).await?;
        Ok(tx)
    }

    async fn confirm(&self, tx: &TxHash) -> Result<Receipt, AppError> {
        let receipt = self.client.wait_for_receipt(tx).await?;
        if !receipt.success {
            return Err(ChainError::Reverted(format!("transaction {tx} failed")).into());
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpsls_core::{commit, DeployArgs, Move, Salt};

    const T0: u64 = 1_700_000_000;

    fn mock_state() -> (PlayerState, MockContractClient) {
        let chain = MockContractClient::at_time(T0);
        let state = PlayerState::new(
            PlayerConfig::default(),
            Arc::new(chain.clone()),
            LocalWallet::new(Address::repeat_byte(0xa1)),
        );
        state.set_time_secs(T0);
        (state, chain)
    }

    #[test]
    fn test_clock_advance() {
        let (state, _) = mock_state();
        assert_eq!(state.now_secs(), T0);
        state.advance_time(301).unwrap();
        assert_eq!(state.now_secs(), T0 + 301);
    }

    #[test]
    fn test_connect_funds_mock_account() {
        let (state, chain) = mock_state();
        assert!(state.require_account().is_err());

        let bob = Address::repeat_byte(0xb0);
        assert_eq!(state.connect(Some(bob)).unwrap(), bob);
        assert_eq!(state.account(), Some(bob));
        assert_eq!(chain.balance(bob), U256::from(DEMO_BALANCE_WEI));

        state.disconnect();
        assert_eq!(state.account(), None);
    }

    #[tokio::test]
    async fn test_refresh_keeps_pending_reveal() {
        let (state, chain) = mock_state();
        let alice = state.connect(None).unwrap();
        let bob = Address::repeat_byte(0xb0);
        let reveal = PendingReveal {
            mv: Move::Paper,
            salt: Salt::from(99u64),
        };
        let args = DeployArgs {
            commitment: commit(reveal.mv, &reveal.salt).unwrap(),
            second_party: bob,
            stake: U256::from(1_000u64),
        };

        let (_, contract) = state.deploy(alice, &args).await.unwrap();
        let session = GameSession::from_chain(&chain.snapshot(contract).await.unwrap());
        state.track_created(contract, session, reveal.clone());

        state.advance_time(300).unwrap();
        let game = state.refresh(contract).await.unwrap();
        assert_eq!(game.reveal, Some(reveal));
        assert_eq!(
            game.turn,
            TurnState::TimedOutClaimable {
                claimant: Player::A
            }
        );
        assert_eq!(state.refresh_watched().await, 1);
    }

    #[test]
    fn test_clock_advance_out_of_range_is_refused() {
        let (state, _) = mock_state();
        assert!(matches!(
            state.advance_time(10_000_000_000_000),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            state.advance_time(i64::MAX),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(state.now_secs(), T0);
    }

    #[tokio::test]
    async fn test_outsider_lookup_is_not_tracked() {
        let (state, chain) = mock_state();
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        chain.fund(alice, U256::from(10_000u64));
        let args = DeployArgs {
            commitment: commit(Move::Rock, &Salt::from(1u64)).unwrap(),
            second_party: bob,
            stake: U256::from(1_000u64),
        };
        let tx = chain.deploy(alice, &args).await.unwrap();
        let contract = chain.wait_for_receipt(&tx).await.unwrap().contract_address.unwrap();

        let outsider = Address::repeat_byte(0xcc);
        assert!(matches!(
            state.refresh_as(contract, outsider).await,
            Err(AppError::Game(rpsls_core::GameError::NotAParticipant(_)))
        ));
        assert!(state.tracked(contract).is_none());
        assert_eq!(state.refresh_watched().await, 0);

        let (role, _) = state.refresh_as(contract, bob).await.unwrap();
        assert_eq!(role, Player::B);
        assert!(state.tracked(contract).is_some());
    }
}
