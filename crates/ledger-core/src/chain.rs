use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::crypto::{KeyPair, PublicKey};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::validation::{validate_block, validate_chain};
use crate::{pow, Block, Transaction};

/// Ordered, append-only sequence of validated blocks. Never empty: index 0 is
/// always the genesis block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
    minimum_difficulty: u32,
}

impl Chain {
    /// A fresh chain holding only a newly mined genesis block.
    pub fn new(genesis_difficulty: u32, minimum_difficulty: u32) -> Result<Self> {
        Ok(Self {
            blocks: vec![genesis_block(genesis_difficulty)?],
            minimum_difficulty,
        })
    }

    /// Restores a chain from blocks received elsewhere, validating all of them.
    pub fn from_blocks(blocks: Vec<Block>, minimum_difficulty: u32) -> Result<Self> {
        validate_chain(&blocks, minimum_difficulty)?;
        Ok(Self::from_validated(blocks, minimum_difficulty))
    }

    pub(crate) fn from_validated(blocks: Vec<Block>, minimum_difficulty: u32) -> Self {
        debug_assert!(!blocks.is_empty());
        Self {
            blocks,
            minimum_difficulty,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Index of the tip block.
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    pub fn minimum_difficulty(&self) -> u32 {
        self.minimum_difficulty
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.blocks)
    }

    pub fn balance(&self, key: &PublicKey) -> i64 {
        self.ledger().balance(key)
    }

    /// Sum of every block's difficulty, the weight used for fork choice.
    pub fn cumulative_difficulty(&self) -> u64 {
        self.ledger().cumulative_difficulty()
    }

    /// Validates `block` against the whole chain and appends it.
    pub fn append(&mut self, block: Block) -> Result<()> {
        validate_block(&block, &self.blocks, self.minimum_difficulty)?;
        self.blocks.push(block);
        Ok(())
    }
}

/// A zero-amount self transfer from a throwaway key, signed and mined at
/// `difficulty` by that same key.
pub fn genesis_block(difficulty: u32) -> Result<Block> {
    let keys = KeyPair::generate();
    let key = keys.public_key().clone();
    let mut tx = Transaction::new(key.clone(), key.clone(), 0)?;
    tx.sign(&keys)?;
    Ok(pow::mine_block(
        Block::new(0, GENESIS_PREVIOUS_HASH, tx),
        difficulty,
        &key,
    ))
}
