use crate::constants::MAX_BLOCKS_PER_MINE_REQUEST;
use crate::{ApiError, AppState};
use axum::{
    extract::{Query, State},
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, PublicKey, SyncOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    id: Uuid,
    public_key: PublicKey,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Head {
    pub height: u64,
    pub hash: String,
    pub cumulative_difficulty: u64,
}

#[derive(Deserialize)]
struct BalanceQuery {
    key: String,
}

#[derive(Serialize)]
struct Balance {
    key: PublicKey,
    balance: i64,
}

#[derive(Deserialize)]
struct PayRequest {
    recipient: PublicKey,
    amount: i64,
}

#[derive(Deserialize)]
struct MineRequest {
    #[serde(default = "one")]
    count: usize,
}

fn one() -> usize {
    1
}

#[derive(Deserialize)]
struct PullRequest {
    peer: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/identity", get(identity))
        .route("/chain", get(chain))
        .route("/chain/head", get(head))
        .route("/balance", get(balance))
        .route("/balances", get(balances))
        .route("/pay", post(pay))
        .route("/mine", post(mine))
        .route("/sync", post(sync))
        .route("/sync/pull", post(pull))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn identity(State(state): State<AppState>) -> Json<Identity> {
    let node = state.node().lock().await;
    Json(Identity {
        id: node.id(),
        public_key: node.public_key().clone(),
    })
}

async fn chain(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.node().lock().await.blocks().to_vec())
}

async fn head(State(state): State<AppState>) -> Json<Head> {
    let node = state.node().lock().await;
    let chain = node.chain();
    Json(Head {
        height: chain.height(),
        hash: chain.tip().hash.clone(),
        cumulative_difficulty: chain.cumulative_difficulty(),
    })
}

async fn balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Json<Balance> {
    let key = PublicKey::from(query.key);
    let balance = state.node().lock().await.balance_of(&key);
    Json(Balance { key, balance })
}

async fn balances(State(state): State<AppState>) -> Json<BTreeMap<PublicKey, i64>> {
    Json(state.node().lock().await.chain().ledger().balances())
}

async fn pay(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> Result<Json<Block>, ApiError> {
    Ok(Json(state.pay(req.recipient, req.amount).await?))
}

async fn mine(
    State(state): State<AppState>,
    Json(req): Json<MineRequest>,
) -> Result<Json<Vec<Block>>, ApiError> {
    if req.count > MAX_BLOCKS_PER_MINE_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "count {} exceeds the limit of {MAX_BLOCKS_PER_MINE_REQUEST}",
            req.count
        )));
    }
    Ok(Json(state.mine(req.count).await?))
}

async fn sync(
    State(state): State<AppState>,
    Json(candidate): Json<Vec<Block>>,
) -> Result<Json<SyncOutcome>, ApiError> {
    Ok(Json(state.sync(candidate).await?))
}

async fn pull(
    State(state): State<AppState>,
    Json(req): Json<PullRequest>,
) -> Result<Json<SyncOutcome>, ApiError> {
    Ok(Json(state.pull(&req.peer).await?))
}
