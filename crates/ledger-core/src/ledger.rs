//! Balances derived by replaying blocks.
//!
//! Nothing here is stored: every query walks the block slice it was built
//! from. A block pays its miner a reward equal to its difficulty, credits the
//! recipient and debits the sender.

use crate::crypto::PublicKey;
use crate::{Block, Transaction};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug)]
pub struct Ledger<'a> {
    blocks: &'a [Block],
}

impl<'a> Ledger<'a> {
    pub fn new(blocks: &'a [Block]) -> Self {
        Self { blocks }
    }

    /// Spendable balance of `key`: rewards plus credits minus debits.
    pub fn balance(&self, key: &PublicKey) -> i64 {
        let rewards = self
            .mined_blocks(key)
            .fold(0i64, |acc, b| acc.saturating_add(i64::from(b.difficulty)));
        let credits = self
            .credits(key)
            .fold(0i64, |acc, tx| acc.saturating_add(tx.amount));
        let debits = self
            .debits(key)
            .fold(0i64, |acc, tx| acc.saturating_add(tx.amount));
        rewards.saturating_add(credits).saturating_sub(debits)
    }

    /// Balance of every key that appears as a miner, sender or recipient.
    pub fn balances(&self) -> BTreeMap<PublicKey, i64> {
        let mut balances: BTreeMap<PublicKey, i64> = BTreeMap::new();
        for block in self.blocks {
            let tx = &block.transaction;
            let reward = balances.entry(block.miner.clone()).or_default();
            *reward = reward.saturating_add(i64::from(block.difficulty));
            let credit = balances.entry(tx.recipient.clone()).or_default();
            *credit = credit.saturating_add(tx.amount);
            let debit = balances.entry(tx.sender.clone()).or_default();
            *debit = debit.saturating_sub(tx.amount);
        }
        balances
    }

    pub fn mined_blocks<'k>(&self, key: &'k PublicKey) -> impl Iterator<Item = &'a Block> + 'k
    where
        'a: 'k,
    {
        self.blocks.iter().filter(move |b| &b.miner == key)
    }

    pub fn transactions(&self) -> impl Iterator<Item = &'a Transaction> {
        self.blocks.iter().map(|b| &b.transaction)
    }

    /// Payments sent by `key`.
    pub fn debits<'k>(&self, key: &'k PublicKey) -> impl Iterator<Item = &'a Transaction> + 'k
    where
        'a: 'k,
    {
        self.transactions().filter(move |tx| &tx.sender == key)
    }

    /// Payments received by `key`.
    pub fn credits<'k>(&self, key: &'k PublicKey) -> impl Iterator<Item = &'a Transaction> + 'k
    where
        'a: 'k,
    {
        self.transactions().filter(move |tx| &tx.recipient == key)
    }

    pub fn cumulative_difficulty(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.difficulty)).sum()
    }
}
