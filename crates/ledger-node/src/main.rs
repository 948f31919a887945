use clap::Parser;
use ledger_core::constants::{DEFAULT_DIFFICULTY, MIN_DIFFICULTY};
use ledger_core::NodeConfig;
use ledger_node::constants::{DEFAULT_LISTEN, PEER_TIMEOUT};
use ledger_node::{bootstrap, router, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node served over HTTP")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Leading zero hex characters required of blocks this node mines
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Lowest difficulty accepted from other nodes
    #[arg(long, default_value_t = MIN_DIFFICULTY)]
    minimum_difficulty: u32,

    /// Search nonces on all cores
    #[arg(long)]
    parallel_mining: bool,

    /// Base URL of a peer whose chain to join (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Milliseconds a peer gets to answer before it is skipped
    #[arg(long, default_value_t = PEER_TIMEOUT.as_millis() as u64)]
    peer_timeout_ms: u64,
}

impl Args {
    fn config(&self) -> NodeConfig {
        NodeConfig {
            difficulty: self.difficulty,
            minimum_difficulty: self.minimum_difficulty,
            parallel_mining: self.parallel_mining,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    let peer_timeout = Duration::from_millis(args.peer_timeout_ms);
    let node = bootstrap(config, &args.peers, peer_timeout).await?;
    info!(
        node = %node.id(),
        key = %node.public_key(),
        height = node.chain().height(),
        "node ready"
    );

    let state = AppState::new(node).with_peer_timeout(peer_timeout);
    let app = router(state.clone());

    let addr: SocketAddr = args.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await?;
    Ok(())
}

async fn shutdown(state: AppState) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
    }
    info!("shutting down; cancelling in-flight mining");
    state.cancel_mining().await;
}
