use super::chain::{Block, BlockData, Blockchain};
use crate::error::ChainError;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Required leading characters of a sealed block's hex hash.
pub const POW_PREFIX: &str = "0000";

/// Hex SHA-256 of `previous_block_hash ++ nonce ++ payload`.
fn hash_payload(previous_block_hash: &str, nonce: u64, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_block_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn meets_target(hash: &str) -> bool {
    hash.starts_with(POW_PREFIX)
}

pub fn hash_block(
    previous_block_hash: &str,
    block_data: &BlockData,
    nonce: u64,
) -> Result<String, ChainError> {
    Ok(hash_payload(previous_block_hash, nonce, &block_data.canonical_json()?))
}

/// Smallest nonce, counting up from zero, whose block hash meets the target.
///
/// Unbounded and CPU-bound: run it off any thread that serves other work.
pub fn proof_of_work(previous_block_hash: &str, block_data: &BlockData) -> Result<u64, ChainError> {
    let payload = block_data.canonical_json()?;
    let mut nonce = 0u64;
    while !meets_target(&hash_payload(previous_block_hash, nonce, &payload)) {
        nonce += 1;
    }
    debug!(index = block_data.index, nonce, "Proof of work found");
    Ok(nonce)
}

impl Blockchain {
    /// Runs proof-of-work over the pending pool and seals it in one call.
    pub fn mine_pending_block(&mut self) -> Result<Block, ChainError> {
        let previous_block_hash = self
            .last_block()
            .ok_or(ChainError::NoGenesisBlock)?
            .hash
            .clone();
        let block_data = self.pending_block_data();
        let nonce = proof_of_work(&previous_block_hash, &block_data)?;
        let hash = hash_block(&previous_block_hash, &block_data, nonce)?;
        Ok(self.seal_block(nonce, &previous_block_hash, &hash))
    }
}
