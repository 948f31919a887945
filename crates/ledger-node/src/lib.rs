//! HTTP host for a single ledger node.
//!
//! The node sits behind one async mutex. Mining never holds it: a block is
//! prepared under the lock, searched for on a blocking thread, then committed
//! under the lock again. Adopting a heavier chain cancels every search that
//! was started against the old one.

pub mod api;
pub mod constants;
pub mod error;

pub use api::router;
pub use error::ApiError;

use crate::constants::PEER_TIMEOUT;
use ledger_core::pow::CancelToken;
use ledger_core::{Block, Chain, Node, NodeConfig, PublicKey, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    node: Arc<Mutex<Node>>,
    // Shared by every search started since the last adoption.
    mining: Arc<Mutex<CancelToken>>,
    http: reqwest::Client,
    peer_timeout: Duration,
}

impl AppState {
    pub fn new(node: Node) -> Self {
        Self {
            node: Arc::new(Mutex::new(node)),
            mining: Arc::new(Mutex::new(CancelToken::new())),
            http: reqwest::Client::new(),
            peer_timeout: PEER_TIMEOUT,
        }
    }

    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    pub fn node(&self) -> &Arc<Mutex<Node>> {
        &self.node
    }

    /// Prepares, mines and commits a payment from this node's key.
    pub async fn pay(&self, recipient: PublicKey, amount: i64) -> Result<Block, ApiError> {
        let (job, cancel) = {
            let node = self.node.lock().await;
            let block = node.prepare_payment(&recipient, amount)?;
            let cancel = self.mining.lock().await.clone();
            (node.mining_job(block), cancel)
        };

        let mined = tokio::task::spawn_blocking(move || job.run(&cancel)).await??;

        let mut node = self.node.lock().await;
        let tip = node.commit(mined).map_err(ApiError::Stale)?;
        Ok(tip.clone())
    }

    /// Mines `count` reward blocks one after another.
    pub async fn mine(&self, count: usize) -> Result<Vec<Block>, ApiError> {
        let own = self.node.lock().await.public_key().clone();
        let mut mined = Vec::with_capacity(count);
        for _ in 0..count {
            mined.push(self.pay(own.clone(), 0).await?);
        }
        Ok(mined)
    }

    /// Offers `candidate` to the node. The chain is validated on a blocking
    /// thread without the node lock; fork choice then runs under it. On
    /// adoption every in-flight search is cancelled and later ones get a
    /// fresh token.
    pub async fn sync(&self, candidate: Vec<Block>) -> Result<SyncOutcome, ApiError> {
        let minimum = self.node.lock().await.config().minimum_difficulty;
        let validated =
            tokio::task::spawn_blocking(move || Chain::from_blocks(candidate, minimum)).await?;
        let candidate = validated.map_err(|err| {
            warn!(%err, "rejected candidate chain");
            ApiError::Rejected(err)
        })?;

        let mut node = self.node.lock().await;
        let outcome = node.sync_chain(candidate).map_err(ApiError::Rejected)?;
        if outcome.adopted() {
            self.cancel_mining().await;
        }
        Ok(outcome)
    }

    /// Fetches a peer's chain and offers it to the node.
    pub async fn pull(&self, peer: &str) -> Result<SyncOutcome, ApiError> {
        let candidate = fetch_chain(&self.http, peer, self.peer_timeout).await?;
        info!(peer, blocks = candidate.len(), "fetched peer chain");
        self.sync(candidate).await
    }

    pub async fn cancel_mining(&self) {
        let mut current = self.mining.lock().await;
        current.cancel();
        *current = CancelToken::new();
    }
}

/// `GET {peer}/chain`, giving up after `timeout`.
pub async fn fetch_chain(
    client: &reqwest::Client,
    peer: &str,
    timeout: Duration,
) -> reqwest::Result<Vec<Block>> {
    client
        .get(format!("{}/chain", peer.trim_end_matches('/')))
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Builds the hosted node. It starts from the chain of the first peer that
/// answers with a valid chain, so it shares that network's genesis block;
/// with no usable peer it mines a genesis block of its own. A peer that does
/// not answer within `timeout` is skipped.
pub async fn bootstrap(
    config: NodeConfig,
    peers: &[String],
    timeout: Duration,
) -> anyhow::Result<Node> {
    let client = reqwest::Client::new();
    for peer in peers {
        match fetch_chain(&client, peer, timeout).await {
            Ok(blocks) => match Node::with_chain(config.clone(), blocks) {
                Ok(node) => {
                    info!(peer = %peer, height = node.chain().height(), "joined peer chain");
                    return Ok(node);
                }
                Err(err) => warn!(peer = %peer, %err, "peer chain rejected"),
            },
            Err(err) => warn!(peer = %peer, %err, "peer unreachable"),
        }
    }
    Ok(Node::new(config)?)
}
