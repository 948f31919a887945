pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod node;
pub mod transaction;
pub mod validation;

pub use block::Block;
pub use chain::Chain;
pub use config::NodeConfig;
pub use crypto::{KeyPair, PublicKey, Signature};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use node::{MiningJob, Node, SyncOutcome};
pub use transaction::Transaction;

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Length-prefixed string field for hash preimages.
pub(crate) fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

pub mod pow {
    use super::Block;
    use crate::constants::{CANCEL_CHECK_INTERVAL, MAX_DIFFICULTY};
    use crate::crypto::PublicKey;
    use crate::error::{LedgerError, Result};
    use sha2::{Digest, Sha256};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tracing::info;

    /// Shared flag that tells an in-flight search to give up.
    #[derive(Clone, Debug, Default)]
    pub struct CancelToken(Arc<AtomicBool>);

    impl CancelToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }

        pub fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Mine the block by incrementing the nonce until its hex hash starts with
    /// `difficulty` zero characters. Blocks the calling thread for as long as the
    /// search takes; there is no upper bound on attempts.
    pub fn mine_block(mut block: Block, difficulty: u32, miner: &PublicKey) -> Block {
        mine_in_place(&mut block, difficulty, miner);
        block
    }

    /// Like [`mine_block`], but returns `MiningCancelled` once `cancel` is set.
    /// The token is polled every `CANCEL_CHECK_INTERVAL` nonces.
    pub fn mine_block_cancellable(
        mut block: Block,
        difficulty: u32,
        miner: &PublicKey,
        cancel: &CancelToken,
    ) -> Result<Block> {
        if search(&mut block, difficulty, miner, Some(cancel)) {
            Ok(block)
        } else {
            Err(LedgerError::MiningCancelled)
        }
    }

    pub(crate) fn mine_in_place(block: &mut Block, difficulty: u32, miner: &PublicKey) {
        search(block, difficulty, miner, None);
    }

    fn search(
        block: &mut Block,
        difficulty: u32,
        miner: &PublicKey,
        cancel: Option<&CancelToken>,
    ) -> bool {
        debug_assert!(difficulty <= MAX_DIFFICULTY);
        block.difficulty = difficulty;
        block.miner = miner.clone();

        let mut base = Sha256::new();
        base.update(block.hash_prefix());

        loop {
            block.nonce = block.nonce.wrapping_add(1);
            let mut hasher = base.clone();
            hasher.update(block.nonce.to_le_bytes());
            let hash = hex::encode(hasher.finalize());

            if meets_difficulty(&hash, difficulty) {
                block.hash = hash;
                info!(
                    index = block.index,
                    nonce = block.nonce,
                    difficulty,
                    hash = %block.hash,
                    "mined block"
                );
                return true;
            }
            if let Some(token) = cancel {
                if block.nonce % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
                    info!(index = block.index, nonce = block.nonce, "mining cancelled");
                    return false;
                }
            }
        }
    }
}
