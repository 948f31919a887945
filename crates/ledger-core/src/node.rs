//! A participant holding one chain and one key pair.
//!
//! Local payments extend the chain; `sync` replaces it wholesale when offered
//! a valid, strictly heavier chain that shares the same genesis block.

use crate::chain::Chain;
use crate::config::NodeConfig;
use crate::crypto::{KeyPair, PublicKey};
use crate::error::{LedgerError, Result};
use crate::mine::{mine_block_parallel, mine_block_parallel_cancellable};
use crate::pow::CancelToken;
use crate::validation::validate_chain;
use crate::{pow, Block, Transaction};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of offering a valid candidate chain to a node. Both variants carry
/// the cumulative difficulty of the local chain (before the decision) and of
/// the candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Adopted { local: u64, candidate: u64 },
    KeptLocal { local: u64, candidate: u64 },
}

impl SyncOutcome {
    pub fn adopted(&self) -> bool {
        matches!(self, SyncOutcome::Adopted { .. })
    }
}

/// An unmined block bundled with everything needed to mine it, so the
/// search can run without access to the node.
#[derive(Clone, Debug)]
pub struct MiningJob {
    pub block: Block,
    pub difficulty: u32,
    pub miner: PublicKey,
    pub parallel: bool,
}

impl MiningJob {
    pub fn run(self, cancel: &CancelToken) -> Result<Block> {
        if self.parallel {
            mine_block_parallel_cancellable(self.block, self.difficulty, &self.miner, cancel)
        } else {
            pow::mine_block_cancellable(self.block, self.difficulty, &self.miner, cancel)
        }
    }
}

#[derive(Debug)]
pub struct Node {
    id: Uuid,
    keys: KeyPair,
    config: NodeConfig,
    chain: Chain,
}

impl Node {
    /// A node with fresh keys and its own freshly mined genesis block.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        let chain = Chain::new(config.difficulty, config.minimum_difficulty)?;
        Ok(Self::assemble(config, chain))
    }

    /// A node with fresh keys that starts from an existing chain, so it shares
    /// that chain's genesis block.
    pub fn with_chain(config: NodeConfig, blocks: Vec<Block>) -> Result<Self> {
        config.validate()?;
        let chain = Chain::from_blocks(blocks, config.minimum_difficulty)?;
        Ok(Self::assemble(config, chain))
    }

    fn assemble(config: NodeConfig, chain: Chain) -> Self {
        let node = Self {
            id: Uuid::new_v4(),
            keys: KeyPair::generate(),
            config,
            chain,
        };
        info!(node = %node.id, key = %node.public_key(), "node created");
        node
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keys.public_key()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn blocks(&self) -> &[Block] {
        self.chain.blocks()
    }

    /// Balance of `key`, replayed from the current chain.
    pub fn balance_of(&self, key: &PublicKey) -> i64 {
        self.chain.balance(key)
    }

    /// Balance of this node's own key.
    pub fn balance(&self) -> i64 {
        self.balance_of(self.public_key())
    }

    /// Builds and signs a payment and links it to the current tip, unmined.
    /// Fails if the amount is negative or exceeds this node's balance.
    pub fn prepare_payment(&self, recipient: &PublicKey, amount: i64) -> Result<Block> {
        let mut tx = Transaction::new(self.public_key().clone(), recipient.clone(), amount)?;
        let balance = self.balance();
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                sender: self.public_key().clone(),
                balance,
                amount,
            });
        }
        tx.sign(&self.keys)?;
        let tip = self.chain.tip();
        Ok(Block::new(tip.index + 1, tip.hash.clone(), tx))
    }

    /// Runs the nonce search for `block` at this node's difficulty. Blocks the
    /// calling thread until a solution is found.
    pub fn mine_block(&self, block: Block) -> Block {
        if self.config.parallel_mining {
            mine_block_parallel(block, self.config.difficulty, self.public_key())
        } else {
            pow::mine_block(block, self.config.difficulty, self.public_key())
        }
    }

    /// Packages a prepared block for mining away from the node.
    pub fn mining_job(&self, block: Block) -> MiningJob {
        MiningJob {
            block,
            difficulty: self.config.difficulty,
            miner: self.public_key().clone(),
            parallel: self.config.parallel_mining,
        }
    }

    /// Validates a mined block against the current chain and appends it. A
    /// block prepared against an older tip fails here.
    pub fn commit(&mut self, block: Block) -> Result<&Block> {
        self.chain.append(block)?;
        Ok(self.chain.tip())
    }

    /// Pays `recipient`: prepare, mine, validate, append.
    ///
    /// # Panics
    /// If the node rejects the block it has just built and mined. That is a
    /// bug in this node, not bad input.
    pub fn pay(&mut self, recipient: &PublicKey, amount: i64) -> Result<&Block> {
        let block = self.prepare_payment(recipient, amount)?;
        let mined = self.mine_block(block);
        if let Err(err) = self.chain.append(mined) {
            panic!("node {} rejected its own block: {err}", self.id);
        }
        Ok(self.chain.tip())
    }

    /// Mines `count` zero-amount self payments, each paying the block reward.
    pub fn mine(&mut self, count: usize) -> Result<()> {
        let own = self.public_key().clone();
        for _ in 0..count {
            self.pay(&own, 0)?;
        }
        Ok(())
    }

    /// Offers a competing chain. Fails closed: an invalid candidate or one
    /// with a different genesis block is an error and leaves the local chain
    /// untouched. A valid candidate replaces the local chain only when its
    /// cumulative difficulty is strictly greater; ties keep the local chain.
    pub fn sync(&mut self, candidate: Vec<Block>) -> Result<SyncOutcome> {
        let candidate = match Chain::from_blocks(candidate, self.config.minimum_difficulty) {
            Ok(chain) => chain,
            Err(err) => {
                warn!(node = %self.id, %err, "rejected candidate chain");
                return Err(err);
            }
        };
        self.sync_chain(candidate)
    }

    /// Fork choice for a candidate that is already a validated [`Chain`], so
    /// hosts can validate without holding the node. A chain validated against
    /// a lower difficulty floor than this node's is checked again.
    pub fn sync_chain(&mut self, candidate: Chain) -> Result<SyncOutcome> {
        let minimum = self.config.minimum_difficulty;
        if candidate.minimum_difficulty() < minimum {
            if let Err(err) = validate_chain(candidate.blocks(), minimum) {
                warn!(node = %self.id, %err, "rejected candidate chain");
                return Err(err);
            }
        }

        if candidate.genesis().hash != self.chain.genesis().hash {
            warn!(node = %self.id, "rejected candidate chain with foreign genesis");
            return Err(LedgerError::GenesisMismatch);
        }

        let local = self.chain.cumulative_difficulty();
        let weight = candidate.cumulative_difficulty();
        if weight <= local {
            info!(node = %self.id, local, candidate = weight, "kept local chain");
            return Ok(SyncOutcome::KeptLocal {
                local,
                candidate: weight,
            });
        }

        self.chain = Chain::from_validated(candidate.into_blocks(), minimum);
        info!(
            node = %self.id,
            local,
            candidate = weight,
            height = self.chain.height(),
            "adopted heavier chain"
        );
        Ok(SyncOutcome::Adopted {
            local,
            candidate: weight,
        })
    }
}
