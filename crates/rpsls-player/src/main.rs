//! RPSLS Player Service

use rpsls_chain::{ContractClient, LocalWallet, MockContractClient, RpcContractClient};
use rpsls_player::config::PlayerConfig;
use rpsls_player::state::PlayerState;
use rpsls_player::watcher::TimeoutWatcher;
use rpsls_player::create_router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PlayerConfig::from_env();

    let (client, wallet): (Arc<dyn ContractClient>, LocalWallet) = match &config.rpc_url {
        Some(url) => {
            let address = config
                .player_address
                .ok_or("PLAYER_ADDRESS must be set together with RPC_URL")?;
            let mut client = RpcContractClient::new(url.clone()).with_chain_id(config.chain_id);
            match &config.bytecode {
                Some(bytecode) => client = client.with_bytecode(bytecode.clone()),
                None => warn!("RPS_BYTECODE not set, game creation is disabled"),
            }
            info!(url = %url, chain_id = config.chain_id, "using JSON-RPC node");
            (Arc::new(client), LocalWallet::new(address))
        }
        None => {
            info!("RPC_URL not set, using in-memory mock chain");
            let wallet = config
                .player_address
                .map(LocalWallet::new)
                .unwrap_or_else(LocalWallet::random);
            (Arc::new(MockContractClient::new()), wallet)
        }
    };

    info!(account = %wallet.address(), "player account");

    let port = config.port;
    let poll = config.timeout_poll;
    let state = Arc::new(PlayerState::new(config, client, wallet));
    let watcher = TimeoutWatcher::spawn(state.clone(), poll);

    let app = create_router(state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Player service listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    watcher.stop();
    info!("Player service stopped");
    Ok(())
}
