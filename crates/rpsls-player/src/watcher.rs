//! Periodic timeout re-evaluation of watched games.

use crate::state::PlayerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Background task refreshing every unresolved game on a fixed interval.
///
/// Aborted when dropped.
pub struct TimeoutWatcher {
    handle: JoinHandle<()>,
}

impl TimeoutWatcher {
    pub fn spawn(state: Arc<PlayerState>, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let watched = state.refresh_watched().await;
                debug!(watched, "timeout watcher tick");
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for TimeoutWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use alloy_primitives::{Address, U256};
    use rpsls_chain::{ContractClient, LocalWallet, MockContractClient};
    use rpsls_core::{commit, DeployArgs, GameSession, Move, PendingReveal, Player, Salt, TurnState};

    const T0: u64 = 1_700_000_000;

    #[tokio::test(start_paused = true)]
    async fn test_watcher_flags_claimable_game() {
        let chain = MockContractClient::at_time(T0);
        let state = Arc::new(PlayerState::new(
            PlayerConfig::default(),
            Arc::new(chain.clone()),
            LocalWallet::new(Address::repeat_byte(0xa1)),
        ));
        state.set_time_secs(T0);
        let alice = state.connect(None).unwrap();

        let reveal = PendingReveal {
            mv: Move::Lizard,
            salt: Salt::from(7u64),
        };
        let args = DeployArgs {
            commitment: commit(reveal.mv, &reveal.salt).unwrap(),
            second_party: Address::repeat_byte(0xb0),
            stake: U256::from(500u64),
        };
        let (_, contract) = state.deploy(alice, &args).await.unwrap();
        let session = GameSession::from_chain(&chain.snapshot(contract).await.unwrap());
        state.track_created(contract, session, reveal);

        let watcher = TimeoutWatcher::spawn(state.clone(), Duration::from_secs(10));
        state.advance_time(300).unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(
            state.tracked(contract).unwrap().turn,
            TurnState::TimedOutClaimable {
                claimant: Player::A
            }
        );
        assert!(watcher.is_running());
        watcher.stop();
    }
}
