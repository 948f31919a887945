use crate::crypto::{self, KeyPair, PublicKey, Signature};
use crate::error::{LedgerError, Result};
use crate::{now_millis, put_str};
use serde::{Deserialize, Serialize};

/// A single value transfer. Must be signed by the sender before it is
/// placed in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub sender: PublicKey,
    pub recipient: PublicKey,
    pub amount: i64,
    pub timestamp: u64,
    /// Commitment over the four fields above, fixed at construction.
    pub content_hash: String,
    pub signature: Option<Signature>,
}

impl Transaction {
    pub fn new(sender: PublicKey, recipient: PublicKey, amount: i64) -> Result<Self> {
        Self::new_at(sender, recipient, amount, now_millis())
    }

    pub fn new_at(
        sender: PublicKey,
        recipient: PublicKey,
        amount: i64,
        timestamp: u64,
    ) -> Result<Self> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        let mut tx = Transaction {
            sender,
            recipient,
            amount,
            timestamp,
            content_hash: String::new(),
            signature: None,
        };
        tx.content_hash = tx.compute_hash();
        Ok(tx)
    }

    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            8 + 4 + self.sender.as_str().len() + 4 + self.recipient.as_str().len() + 8,
        );
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        put_str(&mut bytes, self.sender.as_str());
        put_str(&mut bytes, self.recipient.as_str());
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes
    }

    /// Hash of the current field values. Equals `content_hash` unless the
    /// transaction was altered after construction.
    pub fn compute_hash(&self) -> String {
        crypto::hash(&self.hash_bytes())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signs `content_hash`. A transaction can be signed only once.
    pub fn sign(&mut self, keys: &KeyPair) -> Result<()> {
        if self.is_signed() {
            return Err(LedgerError::AlreadySigned);
        }
        self.signature = Some(keys.sign(&self.content_hash)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (KeyPair, KeyPair) {
        (KeyPair::generate(), KeyPair::generate())
    }

    #[test]
    fn content_hash_matches_fields() {
        let (alice, bob) = keys();
        let tx = Transaction::new_at(
            alice.public_key().clone(),
            bob.public_key().clone(),
            10,
            1_600_000_000_000,
        )
        .unwrap();
        assert_eq!(tx.content_hash, tx.compute_hash());
        assert_eq!(tx.content_hash.len(), 64);
        assert!(!tx.is_signed());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let (alice, bob) = keys();
        let err = Transaction::new(alice.public_key().clone(), bob.public_key().clone(), -1)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount { amount: -1 });
    }

    #[test]
    fn zero_amount_is_allowed() {
        let (alice, _) = keys();
        let tx = Transaction::new(alice.public_key().clone(), alice.public_key().clone(), 0);
        assert!(tx.is_ok());
    }

    #[test]
    fn signing_twice_fails() {
        let (alice, bob) = keys();
        let mut tx =
            Transaction::new(alice.public_key().clone(), bob.public_key().clone(), 3).unwrap();
        tx.sign(&alice).unwrap();
        assert!(tx.is_signed());
        assert_eq!(tx.sign(&alice), Err(LedgerError::AlreadySigned));
    }

    #[test]
    fn signature_binds_content_hash() {
        let (alice, bob) = keys();
        let mut tx =
            Transaction::new(alice.public_key().clone(), bob.public_key().clone(), 3).unwrap();
        tx.sign(&alice).unwrap();
        let signature = tx.signature.clone().unwrap();
        assert!(crypto::verify(&tx.sender, &signature, &tx.content_hash).is_ok());
    }

    #[test]
    fn mutation_changes_recomputed_hash_only() {
        let (alice, bob) = keys();
        let mut tx =
            Transaction::new(alice.public_key().clone(), bob.public_key().clone(), 3).unwrap();
        let committed = tx.content_hash.clone();
        tx.amount = 300;
        assert_eq!(tx.content_hash, committed);
        assert_ne!(tx.compute_hash(), committed);
    }

    #[test]
    fn transaction_json_uses_wire_names() {
        let (alice, bob) = keys();
        let tx = Transaction::new_at(
            alice.public_key().clone(),
            bob.public_key().clone(),
            10,
            1_600_000_000_000,
        )
        .unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["contentHash"], tx.content_hash.as_str());
        assert_eq!(json["signature"], serde_json::Value::Null);
        assert_eq!(json["amount"], 10);
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
