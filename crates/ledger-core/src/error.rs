use crate::crypto::{CryptoError, PublicKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid amount {amount}: amounts must be non-negative")]
    InvalidAmount { amount: i64 },
    #[error("transaction is already signed")]
    AlreadySigned,
    #[error("invalid index: expected {expected}, found {found}")]
    InvalidIndex { expected: u64, found: u64 },
    #[error("invalid previous hash at block {index}")]
    InvalidPreviousHash { index: u64 },
    #[error("difficulty {difficulty} is below the minimum of {minimum}")]
    DifficultyTooLow { difficulty: u32, minimum: u32 },
    #[error("difficulty {difficulty} exceeds the maximum of {maximum}")]
    DifficultyTooHigh { difficulty: u32, maximum: u32 },
    #[error("invalid proof of work at block {index}")]
    InvalidProofOfWork { index: u64 },
    #[error("insufficient balance: {sender} has {balance}, needs {amount}")]
    InsufficientBalance {
        sender: PublicKey,
        balance: i64,
        amount: i64,
    },
    #[error("invalid signature")]
    InvalidSignature,
    #[error("negative balance detected: {key} has {balance}")]
    NegativeBalanceDetected { key: PublicKey, balance: i64 },
    #[error("genesis block does not match")]
    GenesisMismatch,
    #[error("genesis block is malformed")]
    InvalidGenesis,
    #[error("chain has no blocks")]
    EmptyChain,
    #[error("mining was cancelled")]
    MiningCancelled,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl LedgerError {
    /// True for errors raised while judging blocks or chains, as opposed to
    /// local misuse (signing twice, bad config, cancelled search).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidIndex { .. }
                | LedgerError::InvalidPreviousHash { .. }
                | LedgerError::DifficultyTooLow { .. }
                | LedgerError::InvalidProofOfWork { .. }
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::InvalidSignature
                | LedgerError::NegativeBalanceDetected { .. }
                | LedgerError::GenesisMismatch
                | LedgerError::InvalidGenesis
                | LedgerError::EmptyChain
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
