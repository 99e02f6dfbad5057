//! Shared ledger handle and off-thread mining

use crate::blockchain::{hash_block, proof_of_work, Block, BlockData, Blockchain};
use crate::config::Config;
use crate::error::ChainError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub type SharedLedger = Arc<RwLock<Blockchain>>;

pub fn shared(ledger: Blockchain) -> SharedLedger {
    Arc::new(RwLock::new(ledger))
}

/// Applies the network section of `config` to a ledger.
pub fn apply_network_config(ledger: &mut Blockchain, config: &Config) {
    ledger.current_node_url = config.network.node_url.clone();
    for peer in &config.network.peers {
        if ledger.register_node(peer) {
            info!(peer = %peer, "Registered peer node");
        }
    }
}

/// Seals the pending pool without holding the ledger lock during
/// proof-of-work.
///
/// The payload is copied under a read lock and searched on a blocking worker.
/// The write lock is taken only to seal, and only if the tip and the pending
/// transactions are unchanged; otherwise the search starts over.
pub async fn mine_pending_block(ledger: &SharedLedger) -> Result<Block, ChainError> {
    loop {
        let (previous_block_hash, block_data) = pending_work(ledger).await?;
        let (nonce, hash) = search_on_worker(&previous_block_hash, &block_data).await?;
        if let Some(block) =
            seal_if_unchanged(ledger, &previous_block_hash, &block_data, nonce, &hash).await
        {
            return Ok(block);
        }
        debug!(index = block_data.index, "Ledger changed during proof of work, retrying");
    }
}

async fn pending_work(ledger: &SharedLedger) -> Result<(String, BlockData), ChainError> {
    let guard = ledger.read().await;
    let tip = guard.last_block().ok_or(ChainError::NoGenesisBlock)?;
    Ok((tip.hash.clone(), guard.pending_block_data()))
}

async fn search_on_worker(
    previous_block_hash: &str,
    block_data: &BlockData,
) -> Result<(u64, String), ChainError> {
    let nonce = {
        let previous_block_hash = previous_block_hash.to_string();
        let block_data = block_data.clone();
        tokio::task::spawn_blocking(move || proof_of_work(&previous_block_hash, &block_data))
            .await
            .map_err(|e| ChainError::WorkerError(e.to_string()))??
    };
    Ok((nonce, hash_block(previous_block_hash, block_data, nonce)?))
}

/// Seals the searched payload unless the tip or the pending pool moved on.
async fn seal_if_unchanged(
    ledger: &SharedLedger,
    previous_block_hash: &str,
    block_data: &BlockData,
    nonce: u64,
    hash: &str,
) -> Option<Block> {
    let mut guard = ledger.write().await;
    let tip_unchanged = guard.last_block().map(|b| b.hash.as_str()) == Some(previous_block_hash);
    if tip_unchanged && guard.pending_block_data() == *block_data {
        Some(guard.seal_block(nonce, previous_block_hash, hash))
    } else {
        None
    }
}
