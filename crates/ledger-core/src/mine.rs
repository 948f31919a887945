use crate::constants::CANCEL_CHECK_INTERVAL;
use crate::error::{LedgerError, Result};
use crate::pow::{meets_difficulty, CancelToken};
use crate::{crypto::PublicKey, Block};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::info;

/// Mines a block by searching nonces in parallel until its hex hash has
/// `difficulty` leading zeros. Returns the smallest qualifying nonce after the
/// block's current one, so the result is identical to [`crate::pow::mine_block`].
pub fn mine_block_parallel(mut block: Block, difficulty: u32, miner: &PublicKey) -> Block {
    let found = par_search(&mut block, difficulty, miner, None)
        .expect("nonce space exhausted (practically impossible)");
    finish(block, found, difficulty)
}

/// Parallel counterpart of [`crate::pow::mine_block_cancellable`]. Each worker
/// polls `cancel` every `CANCEL_CHECK_INTERVAL` nonces.
pub fn mine_block_parallel_cancellable(
    mut block: Block,
    difficulty: u32,
    miner: &PublicKey,
    cancel: &CancelToken,
) -> Result<Block> {
    match par_search(&mut block, difficulty, miner, Some(cancel)) {
        Some(found) if meets_difficulty(&nonce_hash(&block, found), difficulty) => {
            Ok(finish(block, found, difficulty))
        }
        _ => {
            info!(index = block.index, "parallel mining cancelled");
            Err(LedgerError::MiningCancelled)
        }
    }
}

// A cancelled search stops at a nonce that does not meet the target; callers
// tell the two apart by re-hashing.
fn par_search(
    block: &mut Block,
    difficulty: u32,
    miner: &PublicKey,
    cancel: Option<&CancelToken>,
) -> Option<u64> {
    block.difficulty = difficulty;
    block.miner = miner.clone();

    // Everything but the nonce is fixed for the whole search.
    let mut base = Sha256::new();
    base.update(block.hash_prefix());

    let start = block.nonce.saturating_add(1);
    (start..u64::MAX).into_par_iter().find_first(|nonce| {
        if let Some(token) = cancel {
            if nonce % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
                return true;
            }
        }
        let mut hasher = base.clone();
        hasher.update(nonce.to_le_bytes());
        meets_difficulty(&hex::encode(hasher.finalize()), difficulty)
    })
}

fn nonce_hash(block: &Block, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.hash_prefix());
    hasher.update(nonce.to_le_bytes());
    hex::encode(hasher.finalize())
}

fn finish(mut block: Block, nonce: u64, difficulty: u32) -> Block {
    block.nonce = nonce;
    block.hash = block.compute_hash();
    info!(
        index = block.index,
        nonce,
        difficulty,
        hash = %block.hash,
        "mined block (parallel)"
    );
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pow, KeyPair, Transaction};

    fn sample() -> (KeyPair, Block) {
        let keys = KeyPair::generate();
        let mut tx = Transaction::new_at(
            keys.public_key().clone(),
            keys.public_key().clone(),
            0,
            1_600_000_000_000,
        )
        .unwrap();
        tx.sign(&keys).unwrap();
        let block = Block::new_at(3, "prev", tx, 1_600_000_000_500);
        (keys, block)
    }

    #[test]
    fn parallel_matches_sequential() {
        let (keys, block) = sample();
        let parallel = mine_block_parallel(block.clone(), 3, keys.public_key());
        let sequential = pow::mine_block(block, 3, keys.public_key());
        assert_eq!(parallel.nonce, sequential.nonce);
        assert_eq!(parallel.hash, sequential.hash);
        assert!(parallel.meets_difficulty());
    }

    #[test]
    fn parallel_cancellable_finds_same_nonce_when_left_alone() {
        let (keys, block) = sample();
        let token = CancelToken::new();
        let mined =
            mine_block_parallel_cancellable(block.clone(), 2, keys.public_key(), &token).unwrap();
        let sequential = pow::mine_block(block, 2, keys.public_key());
        assert_eq!(mined.nonce, sequential.nonce);
    }

    #[test]
    fn cancelled_parallel_search_gives_up() {
        let (keys, block) = sample();
        let token = CancelToken::new();
        token.cancel();
        let err = mine_block_parallel_cancellable(block, 64, keys.public_key(), &token).unwrap_err();
        assert_eq!(err, LedgerError::MiningCancelled);
    }
}
