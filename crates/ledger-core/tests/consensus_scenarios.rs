use ledger_core::chain::genesis_block;
use ledger_core::validation::{validate_block, validate_chain};
use ledger_core::{pow, Block, KeyPair, Ledger, LedgerError, Node, NodeConfig, Transaction};

const DIFFICULTY: u32 = 3;

fn config() -> NodeConfig {
    NodeConfig::with_difficulty(DIFFICULTY)
}

#[test]
fn two_nodes_pay_and_sync() -> anyhow::Result<()> {
    let d = DIFFICULTY as i64;
    let mut node_a = Node::new(config())?;
    let mut node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;

    node_a.mine(10)?;
    assert_eq!(node_a.balance(), 10 * d);

    node_a.pay(node_b.public_key(), 10)?;
    node_a.pay(node_b.public_key(), 8)?;
    assert_eq!(node_a.balance(), 30 + 2 * d - (10 + 8));

    let outcome = node_b.sync(node_a.blocks().to_vec())?;
    assert!(outcome.adopted());
    assert_eq!(node_b.balance(), 18);
    assert_eq!(node_b.blocks(), node_a.blocks());

    node_b.pay(node_a.public_key(), 1)?;
    let outcome = node_a.sync(node_b.blocks().to_vec())?;
    assert!(outcome.adopted());
    assert_eq!(node_a.balance(), 18 + 1);
    assert_eq!(node_b.balance(), 18 + d - 1);
    assert_eq!(node_a.blocks(), node_b.blocks());
    assert_eq!(node_a.blocks().len(), 14);
    Ok(())
}

#[test]
fn no_prefix_of_a_valid_chain_has_a_negative_balance() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    let node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;
    node_a.mine(3)?;
    node_a.pay(node_b.public_key(), 9)?;
    node_a.pay(node_b.public_key(), 3)?;

    let blocks = node_a.blocks();
    validate_chain(blocks, config().minimum_difficulty)?;
    for len in 1..=blocks.len() {
        let ledger = Ledger::new(&blocks[..len]);
        for (key, balance) in ledger.balances() {
            assert!(balance >= 0, "{key} is at {balance} after {len} blocks");
        }
    }
    Ok(())
}

#[test]
fn syncing_an_equal_chain_changes_nothing() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    node_a.mine(2)?;
    let before = node_a.blocks().to_vec();

    for _ in 0..3 {
        let outcome = node_a.sync(before.clone())?;
        assert!(!outcome.adopted());
        assert_eq!(node_a.blocks(), before.as_slice());
    }
    Ok(())
}

#[test]
fn foreign_genesis_is_rejected_regardless_of_weight() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    let mut stranger = Node::new(config())?;
    stranger.mine(5)?;
    assert!(stranger.chain().cumulative_difficulty() > node_a.chain().cumulative_difficulty());

    let before = node_a.blocks().to_vec();
    let err = node_a.sync(stranger.blocks().to_vec()).unwrap_err();
    assert_eq!(err, LedgerError::GenesisMismatch);
    assert_eq!(node_a.blocks(), before.as_slice());
    Ok(())
}

#[test]
fn overdraft_with_valid_proof_of_work_fails_validation() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    let mut node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;
    node_a.mine(2)?;

    // a key with no funds builds a correctly mined and signed payment anyway
    let spender = KeyPair::generate();
    let mut candidate = node_a.blocks().to_vec();
    let tip = candidate.last().unwrap().clone();
    let mut tx = Transaction::new(spender.public_key().clone(), node_b.public_key().clone(), 50)?;
    tx.sign(&spender)?;
    let overdraft = pow::mine_block(
        Block::new(tip.index + 1, tip.hash.clone(), tx),
        DIFFICULTY,
        spender.public_key(),
    );
    assert!(overdraft.meets_difficulty());
    candidate.push(overdraft);

    let err = validate_chain(&candidate, config().minimum_difficulty).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { balance: 0, amount: 50, .. }));

    let before = node_b.blocks().to_vec();
    assert!(node_b.sync(candidate).is_err());
    assert_eq!(node_b.blocks(), before.as_slice());
    Ok(())
}

#[test]
fn tampering_with_a_mined_block_is_detected() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    let node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;
    node_a.mine(3)?;
    node_a.pay(node_b.public_key(), 4)?;

    let blocks = node_a.blocks();
    let (prior, last) = blocks.split_at(blocks.len() - 1);
    let original = &last[0];
    let minimum = config().minimum_difficulty;
    validate_block(original, prior, minimum)?;

    let mut amount = original.clone();
    amount.transaction.amount = 2;
    let mut recipient = original.clone();
    recipient.transaction.recipient = node_a.public_key().clone();
    let mut nonce = original.clone();
    nonce.nonce += 1;
    let mut signature = original.clone();
    signature.transaction.signature = prior[1].transaction.signature.clone();

    for tampered in [amount, recipient, nonce, signature] {
        let err = validate_block(&tampered, prior, minimum).unwrap_err();
        assert!(
            matches!(
                err,
                LedgerError::InvalidProofOfWork { .. } | LedgerError::InvalidSignature
            ),
            "unexpected {err:?}"
        );
    }
    Ok(())
}

#[test]
fn candidate_below_difficulty_floor_is_rejected() -> anyhow::Result<()> {
    let node_a = Node::new(config())?;
    let mut node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;
    let miner = KeyPair::generate();

    let mut candidate = node_a.blocks().to_vec();
    for _ in 0..20 {
        let tip = candidate.last().unwrap().clone();
        let mut tx = Transaction::new(miner.public_key().clone(), miner.public_key().clone(), 0)?;
        tx.sign(&miner)?;
        candidate.push(pow::mine_block(
            Block::new(tip.index + 1, tip.hash, tx),
            1,
            miner.public_key(),
        ));
    }

    let err = node_b.sync(candidate).unwrap_err();
    assert_eq!(
        err,
        LedgerError::DifficultyTooLow {
            difficulty: 1,
            minimum: 2
        }
    );
    Ok(())
}

#[test]
fn chains_travel_as_json() -> anyhow::Result<()> {
    let mut node_a = Node::new(config())?;
    let mut node_b = Node::with_chain(config(), node_a.blocks().to_vec())?;
    node_a.mine(2)?;

    let wire = serde_json::to_string(node_a.blocks())?;
    let received: Vec<Block> = serde_json::from_str(&wire)?;
    assert!(node_b.sync(received)?.adopted());
    assert_eq!(node_b.balance_of(node_a.public_key()), 2 * DIFFICULTY as i64);
    Ok(())
}

#[test]
fn genesis_is_shared_only_by_copying() -> anyhow::Result<()> {
    let a = genesis_block(2)?;
    let b = genesis_block(2)?;
    assert_ne!(a.hash, b.hash);
    Ok(())
}
