use super::chain::{
    Block, BlockData, Blockchain, GENESIS_HASH, GENESIS_NONCE, GENESIS_PREVIOUS_HASH,
};
use super::sealer::{hash_block, meets_target, POW_PREFIX};
use crate::error::ChainError;

/// Re-derives every block's proof-of-work hash and link and checks the
/// genesis block's fixed shape. Every block is inspected; all problems found
/// are reported together.
pub fn validate_chain(chain: &[Block]) -> Result<(), ChainError> {
    let genesis = chain
        .first()
        .ok_or_else(|| ChainError::ChainValidationFailure(vec!["chain is empty".to_string()]))?;

    let mut problems = Vec::new();

    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        match hash_block(&previous.hash, &BlockData::of_block(current), current.nonce) {
            Ok(hash) if meets_target(&hash) => {}
            Ok(hash) => problems.push(format!(
                "block {}: hash {} does not start with {}",
                current.index, hash, POW_PREFIX
            )),
            Err(e) => problems.push(format!("block {}: {}", current.index, e)),
        }

        if current.previous_block_hash != previous.hash {
            problems.push(format!(
                "block {}: previous hash {} does not match block {} hash {}",
                current.index, current.previous_block_hash, previous.index, previous.hash
            ));
        }
    }

    if genesis.nonce != GENESIS_NONCE {
        problems.push(format!("genesis: nonce {} != {}", genesis.nonce, GENESIS_NONCE));
    }
    if genesis.previous_block_hash != GENESIS_PREVIOUS_HASH {
        problems.push(format!(
            "genesis: previous hash {:?} != {:?}",
            genesis.previous_block_hash, GENESIS_PREVIOUS_HASH
        ));
    }
    if genesis.hash != GENESIS_HASH {
        problems.push(format!("genesis: hash {:?} != {:?}", genesis.hash, GENESIS_HASH));
    }
    if !genesis.transactions.is_empty() {
        problems.push(format!(
            "genesis: {} transactions, expected none",
            genesis.transactions.len()
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ChainError::ChainValidationFailure(problems))
    }
}

pub fn chain_is_valid(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}

impl Blockchain {
    pub fn is_valid(&self) -> bool {
        chain_is_valid(&self.chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn mined_chain() -> Vec<Block> {
        let mut ledger = Blockchain::new().unwrap();
        for i in 0..2u64 {
            let mut tx = Transaction::new(10 + i, "a", "b", "m", i as i64);
            tx.transaction_id = Some(format!("id{}", i));
            ledger.admit_transaction(tx).unwrap();
            ledger.mine_pending_block().unwrap();
        }
        ledger.chain
    }

    fn problems(chain: &[Block]) -> Vec<String> {
        match validate_chain(chain) {
            Err(ChainError::ChainValidationFailure(p)) => p,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_chain_invalid() {
        assert!(!chain_is_valid(&[]));
    }

    #[test]
    fn test_genesis_only_chain_valid() {
        let ledger = Blockchain::new().unwrap();
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_mined_chain_valid() {
        assert!(chain_is_valid(&mined_chain()));
    }

    #[test]
    fn test_genesis_deviation_invalidates() {
        let mut chain = mined_chain();
        chain[0].nonce = 101;
        assert!(problems(&chain)[0].starts_with("genesis: nonce"));

        let mut chain = mined_chain();
        chain[0].transactions.push(Transaction::new(1, "x", "y", "", 0));
        assert!(!chain_is_valid(&chain));
    }

    #[test]
    fn test_all_bad_blocks_reported() {
        let mut chain = mined_chain();
        chain[1].previous_block_hash = "bogus".to_string();
        chain[2].previous_block_hash = "bogus".to_string();
        let found = problems(&chain);
        assert!(found.iter().any(|p| p.starts_with("block 2: previous hash")));
        assert!(found.iter().any(|p| p.starts_with("block 3: previous hash")));
    }

    #[test]
    fn test_unmined_block_fails_proof_of_work() {
        let mut ledger = Blockchain::new().unwrap();
        let data = ledger.pending_block_data();
        let (nonce, hash) = (0u64..)
            .map(|n| (n, hash_block(GENESIS_HASH, &data, n).unwrap()))
            .find(|(_, hash)| !meets_target(hash))
            .unwrap();
        ledger.seal_block(nonce, GENESIS_HASH, &hash);

        assert!(!ledger.is_valid());
        let found = problems(&ledger.chain);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("block 2: hash"));
    }
}
