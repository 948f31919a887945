//! Block, transaction and whole-chain validity rules.
//!
//! Validation of block `i` needs every block before it, since balances are
//! cumulative. All checks short-circuit on the first failure.

use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::crypto;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::{Block, Transaction};
use tracing::debug;

/// Checks `candidate` as the next block after `prior`, in this order: index,
/// previous hash, difficulty floor, proof of work, then its transaction
/// against the balances of `prior`.
pub fn validate_block(candidate: &Block, prior: &[Block], minimum_difficulty: u32) -> Result<()> {
    let previous = prior.last().ok_or(LedgerError::EmptyChain)?;

    let expected = previous.index + 1;
    if candidate.index != expected {
        return Err(LedgerError::InvalidIndex {
            expected,
            found: candidate.index,
        });
    }

    if candidate.previous_hash != previous.compute_hash() {
        return Err(LedgerError::InvalidPreviousHash {
            index: candidate.index,
        });
    }

    if candidate.difficulty < minimum_difficulty {
        return Err(LedgerError::DifficultyTooLow {
            difficulty: candidate.difficulty,
            minimum: minimum_difficulty,
        });
    }

    check_proof_of_work(candidate)?;
    validate_transaction(&candidate.transaction, &Ledger::new(prior))?;

    debug!(index = candidate.index, hash = %candidate.hash, "block valid");
    Ok(())
}

/// The stored hash must carry the claimed number of leading zeros and must
/// still match the block's fields, including the transaction's content.
fn check_proof_of_work(block: &Block) -> Result<()> {
    let intact = block.meets_difficulty()
        && block.compute_hash() == block.hash
        && block.transaction.compute_hash() == block.transaction.content_hash;
    if intact {
        Ok(())
    } else {
        Err(LedgerError::InvalidProofOfWork { index: block.index })
    }
}

/// Checks that the sender can afford `tx` under `ledger` and that the sender
/// signed it. Any failure of the signature primitives is reported as
/// `InvalidSignature`.
pub fn validate_transaction(tx: &Transaction, ledger: &Ledger<'_>) -> Result<()> {
    if tx.amount < 0 {
        return Err(LedgerError::InvalidAmount { amount: tx.amount });
    }

    let balance = ledger.balance(&tx.sender);
    if tx.amount > balance {
        return Err(LedgerError::InsufficientBalance {
            sender: tx.sender.clone(),
            balance,
            amount: tx.amount,
        });
    }

    let signature = tx.signature.as_ref().ok_or(LedgerError::InvalidSignature)?;
    crypto::verify(&tx.sender, signature, &tx.compute_hash()).map_err(|err| {
        debug!(%err, sender = %tx.sender, "signature rejected");
        LedgerError::InvalidSignature
    })
}

/// Block 0 skips linkage, the difficulty floor and balances, but its proof of
/// work and signature are still checked.
pub fn validate_genesis(genesis: &Block) -> Result<()> {
    if genesis.index != 0 || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(LedgerError::InvalidGenesis);
    }
    check_proof_of_work(genesis)?;
    validate_transaction(&genesis.transaction, &Ledger::new(&[]))
}

/// Replays `blocks` from genesis, validating each block against the prefix
/// before it, then sweeps the final balances for any negative entry.
pub fn validate_chain(blocks: &[Block], minimum_difficulty: u32) -> Result<()> {
    let genesis = blocks.first().ok_or(LedgerError::EmptyChain)?;
    validate_genesis(genesis)?;

    for i in 1..blocks.len() {
        validate_block(&blocks[i], &blocks[..i], minimum_difficulty)?;
    }

    check_balances(blocks)?;
    debug!(blocks = blocks.len(), "chain valid");
    Ok(())
}

/// Fails with `NegativeBalanceDetected` for the first key whose balance over
/// `blocks` is below zero.
pub fn check_balances(blocks: &[Block]) -> Result<()> {
    match Ledger::new(blocks)
        .balances()
        .into_iter()
        .find(|(_, balance)| *balance < 0)
    {
        Some((key, balance)) => Err(LedgerError::NegativeBalanceDetected { key, balance }),
        None => Ok(()),
    }
}
