use crate::crypto::{self, PublicKey};
use crate::transaction::Transaction;
use crate::{now_millis, pow, put_str};
use serde::{Deserialize, Serialize};

/// One mined transaction linked to its predecessor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: u64,
    pub transaction: Transaction,
    pub nonce: u64,
    pub hash: String,
    pub difficulty: u32,
    pub miner: PublicKey,
}

impl Block {
    /// An unmined block: nonce 0, no miner, provisional hash.
    pub fn new(index: u64, previous_hash: impl Into<String>, transaction: Transaction) -> Self {
        Self::new_at(index, previous_hash, transaction, now_millis())
    }

    pub fn new_at(
        index: u64,
        previous_hash: impl Into<String>,
        transaction: Transaction,
        timestamp: u64,
    ) -> Self {
        let mut block = Block {
            index,
            previous_hash: previous_hash.into(),
            timestamp,
            transaction,
            nonce: 0,
            hash: String::new(),
            difficulty: 0,
            miner: PublicKey::default(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Every hashed field except the nonce, which always comes last.
    pub fn hash_prefix(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            8 + 4
                + self.previous_hash.len()
                + 8
                + 4
                + self.transaction.content_hash.len()
                + 4
                + self.miner.as_str().len(),
        );
        bytes.extend_from_slice(&self.index.to_le_bytes());
        put_str(&mut bytes, &self.previous_hash);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        put_str(&mut bytes, &self.transaction.content_hash);
        put_str(&mut bytes, self.miner.as_str());
        bytes
    }

    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = self.hash_prefix();
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    pub fn compute_hash(&self) -> String {
        crypto::hash(&self.hash_bytes())
    }

    /// True when the stored hash carries `difficulty` leading hex zeros.
    pub fn meets_difficulty(&self) -> bool {
        pow::meets_difficulty(&self.hash, self.difficulty)
    }

    /// Blocking nonce search. See [`pow::mine_block`].
    pub fn mine(&mut self, difficulty: u32, miner: &PublicKey) {
        pow::mine_in_place(self, difficulty, miner);
    }
}
