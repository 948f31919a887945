use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Mining and validation settings for one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Leading hex zeros this node mines at; also its reward per block.
    pub difficulty: u32,
    /// Floor every non-genesis block must meet to be accepted.
    pub minimum_difficulty: u32,
    /// Spread the nonce search over the rayon thread pool.
    pub parallel_mining: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            minimum_difficulty: MIN_DIFFICULTY,
            parallel_mining: false,
        }
    }
}

impl NodeConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// A node must be able to accept its own blocks.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::DifficultyTooHigh {
                difficulty: self.difficulty,
                maximum: MAX_DIFFICULTY,
            });
        }
        if self.difficulty < self.minimum_difficulty {
            return Err(LedgerError::DifficultyTooLow {
                difficulty: self.difficulty,
                minimum: self.minimum_difficulty,
            });
        }
        Ok(())
    }
}
