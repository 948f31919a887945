use std::time::Duration;

/// Upper bound on reward blocks a single `POST /mine` may ask for.
pub const MAX_BLOCKS_PER_MINE_REQUEST: usize = 100;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// How long a peer gets to answer `GET /chain` before it counts as unusable.
pub const PEER_TIMEOUT: Duration = Duration::from_secs(5);
