//! HTTP API handlers.

use crate::error::AppError;
use crate::pending::WriteKey;
use crate::state::{PlayerState, TrackedGame};
use alloy_primitives::{Address, U256};
use axum::{
    extract::{Path, State},
    Json,
};
use rpsls_chain::TxHash;
use rpsls_core::protocol::{decimal, parse_address, parse_stake_ether, timeout_call};
use rpsls_core::{
    commit, Commitment, ContractCall, DeployArgs, GameError, GameResult, GameSession, Move,
    PendingReveal, Player, Salt, TurnState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============ Request/Response types ============

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub chain_id: u64,
    pub mock_chain: bool,
}

#[derive(Serialize)]
pub struct WalletResponse {
    pub account: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_wei: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ConnectRequest {
    /// Account to switch to before connecting
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub second_party: String,
    /// Ether amount, e.g. "0.01"
    pub stake: String,
    #[serde(rename = "move")]
    pub mv: String,
    /// Generated when absent or zero
    pub salt: Option<String>,
}

#[derive(Serialize)]
pub struct CreateGameResponse {
    pub contract: Address,
    pub tx_hash: TxHash,
    pub commitment: Commitment,
    /// Needed to reveal; the user must keep it
    pub salt: Salt,
    #[serde(with = "decimal")]
    pub stake_wei: U256,
}

#[derive(Serialize)]
pub struct GameView {
    pub contract: Address,
    pub role: Player,
    pub first_party: Address,
    pub second_party: Address,
    #[serde(with = "decimal")]
    pub stake_wei: U256,
    pub second_move: Option<Move>,
    pub last_action: u64,
    pub turn: TurnState,
    pub seconds_remaining: u64,
    pub next_to_act: Option<Player>,
    pub result: Option<GameResult>,
    pub has_pending_reveal: bool,
    /// Function to call when a timeout is claimable by the viewer
    pub claim_function: Option<&'static str>,
}

impl GameView {
    fn new(contract: Address, role: Player, game: &TrackedGame, now: u64) -> Self {
        let session = &game.session;
        let claim_function = game
            .turn
            .claimable_by()
            .filter(|claimant| *claimant == role)
            .map(|claimant| timeout_call(claimant).function_name());

        Self {
            contract,
            role,
            first_party: session.first_party(),
            second_party: session.second_party(),
            stake_wei: session.stake(),
            second_move: session.has_second_moved().then(|| session.second_move()),
            last_action: session.last_action(),
            turn: game.turn,
            seconds_remaining: session.seconds_remaining(now),
            next_to_act: session.next_to_act(),
            result: game.result,
            has_pending_reveal: game.reveal.is_some(),
            claim_function,
        }
    }
}

#[derive(Serialize)]
pub struct MyGamesResponse {
    pub games: Vec<GameView>,
}

#[derive(Deserialize)]
pub struct PlayRequest {
    #[serde(rename = "move")]
    pub mv: String,
}

#[derive(Deserialize, Default)]
pub struct RevealRequest {
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub salt: Option<String>,
}

#[derive(Serialize)]
pub struct TxResponse {
    pub tx_hash: TxHash,
    pub turn: TurnState,
}

#[derive(Serialize)]
pub struct RevealResponse {
    pub tx_hash: TxHash,
    pub result: GameResult,
}

#[derive(Serialize)]
pub struct TimeoutResponse {
    pub tx_hash: TxHash,
    pub function: &'static str,
    pub claimant: Player,
}

#[derive(Deserialize)]
pub struct TickRequest {
    pub seconds: i64,
}

#[derive(Serialize)]
pub struct TickResponse {
    pub now: u64,
    pub watched: usize,
}

fn parse_contract(raw: &str) -> Result<Address, AppError> {
    Ok(parse_address(raw)?)
}

fn begin_write<'a>(
    state: &'a PlayerState,
    key: WriteKey,
) -> Result<crate::pending::PendingGuard<'a>, AppError> {
    let label = key.to_string();
    state.pending.begin(key).ok_or(AppError::Pending(label))
}

// ============ Wallet handlers ============

pub async fn health(State(state): State<Arc<PlayerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        chain_id: state.config.chain_id,
        mock_chain: state.mock().is_some(),
    })
}

pub async fn get_wallet(State(state): State<Arc<PlayerState>>) -> Json<WalletResponse> {
    let account = state.account();
    Json(WalletResponse {
        account,
        balance_wei: account
            .and_then(|a| state.balance(a))
            .map(|b| b.to_string()),
    })
}

pub async fn connect_wallet(
    State(state): State<Arc<PlayerState>>,
    body: Option<Json<ConnectRequest>>,
) -> Result<Json<WalletResponse>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let address = req.address.as_deref().map(parse_address).transpose()?;
    let account = state.connect(address)?;
    Ok(Json(WalletResponse {
        account: Some(account),
        balance_wei: state.balance(account).map(|b| b.to_string()),
    }))
}

pub async fn disconnect_wallet(State(state): State<Arc<PlayerState>>) -> Json<WalletResponse> {
    state.disconnect();
    Json(WalletResponse {
        account: None,
        balance_wei: None,
    })
}

// ============ Game handlers ============

pub async fn my_games(
    State(state): State<Arc<PlayerState>>,
) -> Result<Json<MyGamesResponse>, AppError> {
    let account = state.require_account()?;
    let now = state.now_secs();
    let games = state
        .games_of(account)
        .into_iter()
        .filter_map(|(contract, game)| {
            let role = game.session.role_of(account)?;
            Some(GameView::new(contract, role, &game, now))
        })
        .collect();
    Ok(Json(MyGamesResponse { games }))
}

pub async fn create_game(
    State(state): State<Arc<PlayerState>>,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, AppError> {
    let account = state.require_account()?;

    let second_party = parse_address(&req.second_party)?;
    let stake = parse_stake_ether(&req.stake)?;
    let mv: Move = req.mv.parse()?;
    if mv.is_null() {
        return Err(GameError::InvalidMove("first move cannot be Null".to_string()).into());
    }
    let salt = match req.salt.as_deref().map(str::parse::<Salt>).transpose()? {
        Some(salt) if !salt.is_zero() => salt,
        _ => Salt::random(),
    };

    let commitment = commit(mv, &salt)?;
    // Validate the parties and stake before anything is sent
    let session = GameSession::create(account, second_party, stake, commitment, state.now_secs())?;

    let _guard = begin_write(&state, WriteKey::Deploy(account))?;
    let args = DeployArgs {
        commitment,
        second_party,
        stake,
    };
    let (tx_hash, contract) = state.deploy(account, &args).await?;
    state.track_created(
        contract,
        session.with_contract(contract),
        PendingReveal { mv, salt },
    );
    // Pick up the block timestamp as lastAction. The stake is already
    // locked, so the salt must reach the caller even if this read fails.
    if let Err(e) = state.refresh(contract).await {
        warn!(%contract, error = %e, "could not read freshly deployed game");
    }

    info!(%contract, %second_party, %stake, "game created");

    Ok(Json(CreateGameResponse {
        contract,
        tx_hash,
        commitment,
        salt,
        stake_wei: stake,
    }))
}

pub async fn get_game(
    State(state): State<Arc<PlayerState>>,
    Path(contract): Path<String>,
) -> Result<Json<GameView>, AppError> {
    let contract = parse_contract(&contract)?;
    let account = state.require_account()?;
    let (role, game) = state.refresh_as(contract, account).await?;
    Ok(Json(GameView::new(contract, role, &game, state.now_secs())))
}

pub async fn play(
    State(state): State<Arc<PlayerState>>,
    Path(contract): Path<String>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<TxResponse>, AppError> {
    let contract = parse_contract(&contract)?;
    let account = state.require_account()?;
    let mv: Move = req.mv.parse()?;

    let (role, mut game) = state.refresh_as(contract, account).await?;
    if role != Player::B {
        return Err(AppError::BadRequest("Only the second party can play".to_string()));
    }
    game.session.submit_second_move(mv, state.now_secs())?;

    let call = ContractCall::Play(mv);
    let _guard = begin_write(
        &state,
        WriteKey::Call {
            contract,
            function: call.function_name(),
        },
    )?;
    // The stake attached must equal the one read from chain
    let tx_hash = state.send(account, contract, &call, game.session.stake()).await?;
    let turn = match state.refresh(contract).await {
        Ok(refreshed) => refreshed.turn,
        Err(e) => {
            warn!(%contract, error = %e, "could not re-read game after play");
            game.session.turn_state(state.now_secs())
        }
    };

    info!(%contract, %mv, "second move played");
    Ok(Json(TxResponse { tx_hash, turn }))
}

pub async fn reveal(
    State(state): State<Arc<PlayerState>>,
    Path(contract): Path<String>,
    body: Option<Json<RevealRequest>>,
) -> Result<Json<RevealResponse>, AppError> {
    let contract = parse_contract(&contract)?;
    let account = state.require_account()?;
    let Json(req) = body.unwrap_or_default();

    let (role, mut game) = state.refresh_as(contract, account).await?;
    if role != Player::A {
        return Err(AppError::BadRequest("Only the first party can reveal".to_string()));
    }

    let stored = game.reveal.clone();
    let mv = match req.mv.as_deref() {
        Some(raw) => raw.parse::<Move>()?,
        None => stored.as_ref().map(|r| r.mv).ok_or_else(|| {
            AppError::BadRequest("No stored move for this game; provide move and salt".to_string())
        })?,
    };
    let salt = match req.salt.as_deref() {
        Some(raw) => raw.parse::<Salt>()?,
        None => stored.as_ref().map(|r| r.salt).ok_or_else(|| {
            AppError::BadRequest("No stored salt for this game; provide move and salt".to_string())
        })?,
    };

    // A mismatching reveal never reaches the chain
    let result = game.session.reveal_first_move(mv, &salt)?;

    let call = ContractCall::Solve(mv, salt);
    let _guard = begin_write(
        &state,
        WriteKey::Call {
            contract,
            function: call.function_name(),
        },
    )?;
    let tx_hash = state.send(account, contract, &call, U256::ZERO).await?;
    state.record_result(contract, result);
    if let Err(e) = state.refresh(contract).await {
        warn!(%contract, error = %e, "could not re-read game after reveal");
    }

    info!(%contract, %result, "game resolved by reveal");
    Ok(Json(RevealResponse { tx_hash, result }))
}

pub async fn claim_timeout(
    State(state): State<Arc<PlayerState>>,
    Path(contract): Path<String>,
) -> Result<Json<TimeoutResponse>, AppError> {
    let contract = parse_contract(&contract)?;
    let account = state.require_account()?;

    let (claimant, mut game) = state.refresh_as(contract, account).await?;
    game.session.claim_timeout(claimant, state.now_secs())?;

    let call = timeout_call(claimant);
    let _guard = begin_write(
        &state,
        WriteKey::Call {
            contract,
            function: call.function_name(),
        },
    )?;
    let tx_hash = state.send(account, contract, &call, U256::ZERO).await?;
    if let Err(e) = state.refresh(contract).await {
        warn!(%contract, error = %e, "could not re-read game after timeout claim");
    }

    info!(%contract, %claimant, function = call.function_name(), "timeout claimed");
    Ok(Json(TimeoutResponse {
        tx_hash,
        function: call.function_name(),
        claimant,
    }))
}

// ============ System handlers ============

/// Advance the local clock, then re-evaluate watched games at once.
pub async fn tick(
    State(state): State<Arc<PlayerState>>,
    Json(req): Json<TickRequest>,
) -> Result<Json<TickResponse>, AppError> {
    state.advance_time(req.seconds)?;
    let watched = state.refresh_watched().await;
    Ok(Json(TickResponse {
        now: state.now_secs(),
        watched,
    }))
}
